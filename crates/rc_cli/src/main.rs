use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    rc_cli::run().await
}
