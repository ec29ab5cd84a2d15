//! Span context minting and annotation encoding
//!
//! A Pod's span context travels inside a single annotation value, so the
//! binary OpenCensus encoding is wrapped in standard padded base64. Any
//! OpenCensus-compatible consumer can decode the annotation without sharing
//! code with this webhook.

use std::fmt;

use opentelemetry::trace::{Span as _, SpanContext, Tracer as _, TracerProvider as _};
use opentelemetry::Context;
use opentelemetry_contrib::trace::propagator::binary::{Base64Format, BinaryPropagator};
use opentelemetry_sdk::trace::{
    self as sdktrace, RandomIdGenerator, Sampler, Tracer, TracerProvider,
};

use crate::config::SampleRate;

/// Instrumentation scope of the tracer that mints Pod span contexts
const TRACER_NAME: &str = "trace-webhook";

/// Mints fresh span contexts under a fixed sampling policy
///
/// Built once at startup from a validated [`SampleRate`] and shared read-only
/// by every admission request. The provider has no span processors, so the
/// transient spans started here exist only to obtain a well-formed context and
/// are never exported.
pub struct SpanContextMinter {
    // The tracer only holds a weak reference to its provider.
    _provider: TracerProvider,
    tracer: Tracer,
    rate: SampleRate,
}

impl SpanContextMinter {
    /// Create a minter whose root spans are sampled with probability `rate`
    pub fn new(rate: SampleRate) -> Self {
        let provider = TracerProvider::builder()
            .with_config(
                sdktrace::config()
                    .with_sampler(Sampler::TraceIdRatioBased(rate.get()))
                    .with_id_generator(RandomIdGenerator::default()),
            )
            .build();
        let tracer = provider.tracer(TRACER_NAME);

        Self {
            _provider: provider,
            tracer,
            rate,
        }
    }

    /// The sampling rate this minter was built with
    pub fn sample_rate(&self) -> SampleRate {
        self.rate
    }

    /// Start and immediately drop a root span, returning its context
    pub fn mint(&self) -> SpanContext {
        let span = self.tracer.start_with_context("", &Context::new());
        span.span_context().clone()
    }

    /// Mint a new span context and encode it for storage in an annotation
    pub fn embeddable(&self) -> String {
        encode(&self.mint())
    }
}

impl fmt::Debug for SpanContextMinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanContextMinter")
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}

/// Encode a span context as base64 of its binary form
pub fn encode(context: &SpanContext) -> String {
    BinaryPropagator::new().serialize_into_base64(context)
}

/// Decode an annotation value back into a span context
///
/// Returns `None` when the value is not valid base64 or the decoded bytes are
/// not a valid binary span context.
pub fn decode(value: &str) -> Option<SpanContext> {
    let context = BinaryPropagator::new().deserialize_from_base64(value);
    context.is_valid().then_some(context)
}
