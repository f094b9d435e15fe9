//! `extforge doctor` command

use anyhow::Result;

use super::{load_project_config, requirements};
use crate::cli::DoctorArgs;
use extforge::core::HostPlatform;
use extforge::ops::{doctor, format_report, DoctorOptions};
use extforge::util::{Shell, SystemRunner};

pub fn execute(args: DoctorArgs, shell: &Shell) -> Result<()> {
    let config = load_project_config(&args.source_dir)?;
    let (requirements, interpreter) = requirements(&config, args.python.as_deref())?;

    let options = DoctorOptions {
        platform: args.platform.unwrap_or_else(HostPlatform::host),
        interpreter,
    };

    let report = doctor(&requirements, &SystemRunner, &options);

    if !shell.is_quiet() {
        print!("{}", format_report(&report, shell.is_verbose()));
    }

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
