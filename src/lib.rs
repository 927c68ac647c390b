#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::module_inception)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::too_many_lines)]
#![doc = include_str!("../README.md")]

pub mod codec;
pub mod context;
pub mod diagnostics;
pub mod dynamic;
mod error;
pub mod fix;
pub mod fixer;
pub mod ops;
pub mod optics;
pub mod path;
pub mod result;
pub mod rules;
pub mod schema;
pub mod template;
pub mod types;
mod version;

pub use crate::{
    error::Error,
    version::{
        IntoVersion,
        Version,
    },
};

/// Prelude: convenient import for commonly used items provided by the crate.
#[allow(unused_imports)]
pub mod prelude {
    #[doc(inline)]
    pub use crate::{
        codec::{
            self,
            Codec,
            Either,
        },
        context::Context,
        diagnostics::{
            DiagnosticOptions,
            MigrationReport,
        },
        dynamic::{
            Dynamic,
            TaggedDynamic,
        },
        error::Error,
        fix::{
            DataFix,
            FnFix,
            RuleFix,
            SchemaDataFix,
        },
        fixer::{
            Bootstrap,
            DataFixer,
            DataFixerFactory,
            FixRegistrar,
        },
        ops::{
            DefaultOps,
            JsonOps,
            Ops,
        },
        optics::{
            Finder,
            Optic,
        },
        path::Path,
        result::DataResult,
        rules::{
            self,
            Rule,
        },
        schema::{
            Schema,
            SchemaRegistry,
            SchemaRegistryBuilder,
        },
        template::{
            self,
            TypeTemplate,
        },
        types::{
            Type,
            TypeId,
            Typed,
        },
        version::{
            IntoVersion,
            Version,
        },
    };

    #[cfg(feature = "toml")]
    #[doc(inline)]
    pub use crate::ops::TomlOps;
}
