// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Schema YAML Generator
//!
//! Generates JSON Schema documents, as YAML, for the public API payloads in
//! src/models.rs so clients can validate requests without the Rust types.
//!
//! Usage:
//!   cargo run --bin schemagen
//!
//! Generated files will be written to deploy/schemas/ with proper headers.

use dnscentral::central::diagnostics::PingReport;
use dnscentral::models::{
    CreateDomain, CreateRecord, CreateServer, CreateTsigKey, Domain, Record, Server, TsigKey,
    UpdateDomain, UpdateRecord, UpdateServer, UpdateTsigKey,
};
use schemars::JsonSchema;
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/models.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin schemagen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/schemas");

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    println!("Generating schema YAML files from src/models.rs...");

    generate_schema::<Domain>("domain.schema.yaml", output_dir)?;
    generate_schema::<CreateDomain>("create-domain.schema.yaml", output_dir)?;
    generate_schema::<UpdateDomain>("update-domain.schema.yaml", output_dir)?;
    generate_schema::<Record>("record.schema.yaml", output_dir)?;
    generate_schema::<CreateRecord>("create-record.schema.yaml", output_dir)?;
    generate_schema::<UpdateRecord>("update-record.schema.yaml", output_dir)?;
    generate_schema::<Server>("server.schema.yaml", output_dir)?;
    generate_schema::<CreateServer>("create-server.schema.yaml", output_dir)?;
    generate_schema::<UpdateServer>("update-server.schema.yaml", output_dir)?;
    generate_schema::<TsigKey>("tsigkey.schema.yaml", output_dir)?;
    generate_schema::<CreateTsigKey>("create-tsigkey.schema.yaml", output_dir)?;
    generate_schema::<UpdateTsigKey>("update-tsigkey.schema.yaml", output_dir)?;
    generate_schema::<PingReport>("ping-report.schema.yaml", output_dir)?;

    println!("✓ Successfully generated schema YAML files in deploy/schemas/");

    Ok(())
}

fn generate_schema<T: JsonSchema>(
    filename: &str,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = schemars::schema_for!(T);
    let yaml = serde_yaml::to_string(&schema)?;

    let content = format!("{COPYRIGHT_HEADER}{yaml}");
    let output_path = output_dir.join(filename);
    fs::write(&output_path, content)?;

    println!("  ✓ Generated {}", output_path.display());
    Ok(())
}
