use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    printwatch_lib::run().await
}
