//! Fetch command - run one request through the active worker

use super::WorkerContext;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{SootError, SootResult};
use crate::http::{Request, Response};
use crate::network::Network;
use crate::ui::{self, UiContext};
use crate::worker::FetchOutcome;
use std::io::Write;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect();
    let runtime = WorkerContext::open(config, state_dir)?;
    runtime.controlled().await?;

    let request = build_request(&runtime, &args)?;
    debug!("{} {}", request.method(), request.url());

    match runtime.worker.handle_fetch(request.clone()).await? {
        FetchOutcome::Passthrough => {
            let response = runtime.network.fetch(&request).await?;
            report(&ctx, &response, "passthrough");
            write_body(&ctx, &response, args.output.as_deref()).await?;
        }
        FetchOutcome::Respond(served) => {
            let (response, source, lifetime) = served.into_parts();
            report(&ctx, &response, &source.to_string());
            write_body(&ctx, &response, args.output.as_deref()).await?;
            lifetime.settle().await;
        }
    }

    Ok(())
}

fn build_request(runtime: &WorkerContext, args: &FetchArgs) -> SootResult<Request> {
    let url = runtime.worker.settings().resolve(&args.url)?;
    let mut request = if args.navigate {
        Request::navigate(url)
    } else {
        Request::get(url)
    };
    request = request.with_method(&args.method);
    if let Some(ref accept) = args.accept {
        request = request.with_header("accept", accept.clone());
    }
    Ok(request)
}

fn report(ctx: &UiContext, response: &Response, source: &str) {
    ui::key_value_status(ctx, "status", &response.status().to_string(), response.is_success());
    ui::key_value(ctx, "source", source);
    if let Some(content_type) = response.headers().get("content-type") {
        ui::key_value(ctx, "content-type", content_type);
    }
}

async fn write_body(ctx: &UiContext, response: &Response, output: Option<&Path>) -> SootResult<()> {
    match output {
        Some(path) => {
            fs::write(path, response.body())
                .await
                .map_err(|e| SootError::io(format!("writing {}", path.display()), e))?;
            ui::step_ok_detail(ctx, "Body written", &path.display().to_string());
        }
        None => {
            println!();
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(response.body())
                .and_then(|()| stdout.flush())
                .map_err(|e| SootError::io("writing body to stdout", e))?;
            println!();
        }
    }
    Ok(())
}
