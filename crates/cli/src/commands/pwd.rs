//! pwd command - Print the working directory
//!
//! Answers from the parent record alone, without contacting the drive.

use gd_core::{Parent, ParentManager};
use serde::Serialize;

use super::fail;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Debug, Serialize)]
struct PwdOutput<'a> {
    parent: &'a str,
    drive: &'a str,
    path: String,
    id: &'a str,
}

/// Execute the pwd command
pub fn execute(parent: Option<&str>, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let record = match ParentManager::new().and_then(|m| m.resolve(parent)) {
        Ok(p) => p,
        Err(e) => return fail(&formatter, &e),
    };

    let output = pwd_output(&record);
    formatter.emit(&output, || output.path.clone());
    ExitCode::Success
}

fn pwd_output(parent: &Parent) -> PwdOutput<'_> {
    PwdOutput {
        parent: &parent.name,
        drive: &parent.drive_name,
        path: parent.display_cwd(),
        id: parent.working_id(),
    }
}
