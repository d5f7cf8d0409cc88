use std::process::ExitCode;

use damn::ui::output;

fn main() -> ExitCode {
    match damn::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
