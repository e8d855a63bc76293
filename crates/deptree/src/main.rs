use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match deptree_lib::main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(deptree_lib::exit_code(&e))
        }
    }
}
