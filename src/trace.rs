use clap_verbosity_flag::Verbosity;
use color_eyre::eyre::{eyre, Result};
use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_otlp::{SpanExporter, WithExportConfig as _};
use opentelemetry_sdk::{
    runtime,
    trace::{span_processor_with_async_runtime::BatchSpanProcessor, SdkTracerProvider},
    Resource,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::args::Args;

const SERVICE_NAME: &str = "reel-upload";

pub(crate) fn init(args: &Args) -> Result<WorkerGuard> {
    // Log file, as the terminal belongs to the UI.
    let file_appender = tracing_appender::rolling::never(".", "reel-upload.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(if args.otlp_export {
            Some({
                // Open telemetry export
                let exporter = SpanExporter::builder()
                    .with_http()
                    .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
                    .build()?;
                let provider = SdkTracerProvider::builder()
                    .with_span_processor(BatchSpanProcessor::builder(exporter, runtime::Tokio).build())
                    .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
                    .build();
                let tracer = provider.tracer(SERVICE_NAME);
                global::set_tracer_provider(provider);

                // Create a tracing layer with the configured tracer
                let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

                telemetry.with_filter(env_filter(&args.verbosity))
            })
        } else {
            None
        })
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_thread_names(true)
                .with_line_number(true)
                .with_writer(non_blocking)
                .with_filter(env_filter(&args.verbosity)),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|_| eyre!("Tracing initialization failed"))?;

    Ok(guard)
}

fn env_filter(verbosity: &Verbosity) -> EnvFilter {
    // Use `-v` (warn) to `-vvvv` (trace) for simple verbosity,
    // or use `RUST_LOG=target[span{field=value}]=level` for fine-grained verbosity control.
    // See https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
    EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy()
}
