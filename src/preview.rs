use anyhow::{Context, Result};
use log::info;

use crate::{
    apply_input_overrides, cli::PreviewArgs, config::AuditConfig, engine::SchemaInferenceEngine,
    table,
};

pub fn execute(config: AuditConfig, args: &PreviewArgs) -> Result<()> {
    let mut config = apply_input_overrides(config, &args.input, &args.input_file);
    config.preview_rows = args.rows;
    let engine = SchemaInferenceEngine::new(config).context("Validating settings")?;
    let (decision, loaded) = engine
        .load(&args.input_file, args.input.encoding.as_deref())
        .with_context(|| format!("Reading {:?}", args.input_file))?;

    println!(
        "Encoding: {} (confidence {:.2}{})",
        loaded.encoding.name(),
        decision.confidence,
        if loaded.retried {
            ", after retry"
        } else if decision.fallback_used {
            ", default used"
        } else {
            ""
        }
    );
    let rows = loaded.table.preview(args.rows);
    table::print_table(&loaded.table.headers, rows);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        loaded.table.row_count(),
        args.input_file
    );
    Ok(())
}
