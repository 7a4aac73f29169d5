/*!
 * # noveltrans
 *
 * A Rust library for translating web-novel chapter text with AI backends.
 *
 * ## Features
 *
 * - Segmented translation of line-oriented documents
 * - Pluggable translation backends:
 *   - Generic web machine-translation service
 *   - Specialized fine-tuned LLM (OpenAI-compatible server)
 *   - Local offline engine supplied by the host
 * - Cross-segment context carryover for context-aware models
 * - User glossary, applied as substitution or as prompt hints
 * - Degeneration and line-count checks with escalating retries
 * - Upload gating on vetted model fingerprints
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The segmented translation pipeline:
 *   - `translation::segment`: Length-bounded batching
 *   - `translation::glossary`: Glossary substitution
 *   - `translation::dispatcher`: Task dispatch and drivers
 *   - backend implementations per service kind
 * - `providers`: Low-level clients for the remote APIs
 * - `content`: Interface types of the upstream content collaborator
 * - `language_utils`: Script-based source-language heuristics
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod content;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{BackendKind, Config};
pub use errors::{AppError, ProviderError, TranslationError};
pub use translation::dispatcher::{dispatch, translate, TaskCallback, TaskDesc, TaskKind, TaskParams};
pub use translation::glossary::Glossary;
pub use translation::{Logger, SegmentContext, SegmentTranslator, TranslatorConfig};
