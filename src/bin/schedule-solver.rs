//! The JSON Boundary's executable (§4.6/§6): reads a single JSON object
//! from stdin, runs the pipeline, and writes a single JSON object to
//! stdout. Exit code 0 iff `success == true`. A panic anywhere in the
//! pipeline is caught here and turned into a `success:false` response
//! rather than an unformatted abort (§7's `InternalError`), since stdout
//! must never carry anything but the one response object.

use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};

use schedule_solver::boundary::{run_pipeline, Response};
use schedule_solver::error::PipelineError;
use schedule_solver::logging::init_default_logging;

fn main() {
    init_default_logging();

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        emit_and_exit(&Response::failure(&PipelineError::Internal(format!(
            "failed to read stdin: {e}"
        ))));
    }

    let raw: serde_json::Value = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            emit_and_exit(&Response::failure(&PipelineError::invalid_input(
                "$",
                format!("request body is not valid JSON: {e}"),
            )));
        }
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_pipeline(raw)))
        .map_err(|payload| anyhow::anyhow!(panic_message(&payload)));

    let response = match outcome {
        Ok(Ok(output)) => Response::success(output),
        Ok(Err(err)) => Response::failure(&err),
        // A panic escaped the pipeline. `anyhow` is the catch-all here
        // because it isn't one of the five typed `PipelineError` kinds
        // (§0.2/§7's `InternalError`) — anything `thiserror`'s enum
        // doesn't model lands here instead.
        Err(panic_err) => Response::failure(&PipelineError::Internal(panic_err.to_string())),
    };

    let success = matches!(response, Response::Success { .. });
    emit(&response);
    std::process::exit(if success { 0 } else { 1 });
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "solver panicked with a non-string payload".to_string()
    }
}

fn emit(response: &Response) {
    let body = serde_json::to_string(response)
        .unwrap_or_else(|_| r#"{"success":false,"error":"failed to serialize response","errorType":"InternalError"}"#.to_string());
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{body}");
}

fn emit_and_exit(response: &Response) -> ! {
    emit(response);
    std::process::exit(1);
}
