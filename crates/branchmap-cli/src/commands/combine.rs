use std::path::Path;

use branchmap_core::Combiner;

use crate::cli::CombineArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &CombineArgs, data_dir: &Path) -> Result<CommandResult, CliError> {
    let mut combiner = Combiner::new(data_dir);
    if let Some(output) = &args.output {
        combiner = combiner.with_output(output);
    }

    let report = combiner.run()?;
    let mut warnings = report.warnings();
    if report.output.is_none() {
        warnings.push(String::from("no rows with coordinates found, combined dataset not written"));
    }

    Ok(CommandResult::ok(serde_json::to_value(&report)?).with_warnings(warnings))
}
