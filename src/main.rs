use std::process::ExitCode;

fn main() -> ExitCode {
    match churn_lab::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("churn failed with exit code {}", err.exit_code());
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
