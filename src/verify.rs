use anyhow::{Context, Result};
use log::info;

use crate::{
    apply_input_overrides, cli::VerifyArgs, config::AuditConfig, engine::SchemaInferenceEngine,
    schema::Schema, table,
};

pub fn execute(config: AuditConfig, args: &VerifyArgs) -> Result<()> {
    let config = apply_input_overrides(config, &args.input, &args.input_file);
    let warn_ratio = config.warn_ratio;
    let schema = Schema::load(&args.schema)
        .with_context(|| format!("Loading schema from {:?}", args.schema))?;
    let engine = SchemaInferenceEngine::new(config).context("Validating settings")?;
    let report = engine
        .verify(&args.input_file, &schema, args.input.encoding.as_deref())
        .with_context(|| format!("Verifying {:?} against {:?}", args.input_file, args.schema))?;

    if let Some(output) = &args.output {
        report
            .save(output)
            .with_context(|| format!("Writing consistency report to {output:?}"))?;
        info!("Wrote consistency report to {output:?}");
    }

    if report.is_empty() {
        println!("{:?} has no data rows to verify.", args.input_file);
        return Ok(());
    }
    table::print_table(
        &table::schema_summary_headers(),
        &table::schema_summary_rows(&schema, &report),
    );

    let low: Vec<_> = report.low_consistency(warn_ratio).collect();
    if low.is_empty() {
        println!(
            "\n✓ {:?} matches schema ({} column(s))",
            args.input_file,
            schema.len()
        );
        return Ok(());
    }
    println!(
        "\n{} column(s) below {:.0}% type consistency:",
        low.len(),
        warn_ratio * 100.0
    );
    for column in low {
        let samples = column
            .mismatches
            .iter()
            .map(|m| format!("row {}: '{}'", m.row_index, m.raw_value))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} ({}): {} mismatch(es); {samples}",
            column.column_name, column.inferred_type, column.mismatch_count
        );
    }
    Ok(())
}
