use crate::commands::{open_dashboard, CommandResult};
use crate::ViewArgs;

pub fn run(args: &ViewArgs) -> CommandResult {
    match open_dashboard("derive", args) {
        Ok(dashboard) => CommandResult::success("derive", &*dashboard.view()),
        Err(failure) => failure,
    }
}
