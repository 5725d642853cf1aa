//! Named factories for normalizers and converters.
//!
//! Configuration names each chain stage (`{ name = "romaji", max_candidates = 5 }`).
//! The [`Registry`] maps the name to a factory, deserializing the remaining
//! keys into that factory's typed options struct. Built-in stages are
//! registered by [`Registry::with_defaults`]; embedders add their own with
//! [`Registry::register_normalizer`] and [`Registry::register_converter`].

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::analysis::Analyzer;
use crate::config::{ConfigError, ConversionConfig, StageConfig};
use crate::converter::{
    AnalyzerConverter, ConverterChain, KatakanaConverter, KatakanaToAlphabetConverter, ReadingConverter,
};
use crate::error::{Error, Result};
use crate::normalizer::{
    AnalyzerNormalizer, FullWidthToHalfWidthAlphabetNormalizer, HalfWidthToFullWidthKanaNormalizer, Normalizer,
    NormalizerChain, TransliteratorNormalizer,
};

/// Shared collaborators handed to every factory.
#[derive(Clone)]
pub struct BuildContext {
    /// Analyzer used by analyzer-backed stages.
    pub analyzer: Arc<dyn Analyzer>,
    /// Chain-wide candidate cap.
    pub max_candidates: usize,
}

type NormalizerFactory = Box<dyn Fn(&Value, &BuildContext) -> Result<Arc<dyn Normalizer>> + Send + Sync>;
type ConverterFactory = Box<dyn Fn(&Value, &BuildContext) -> Result<Arc<dyn ReadingConverter>> + Send + Sync>;

/// Options of the `transliterator` normalizer.
#[derive(Debug, Clone, Deserialize)]
pub struct TransliteratorOptions {
    /// Transliterator id, e.g. `"Any-Lower; Fullwidth-Halfwidth"`.
    pub id: String,
}

/// Options of the `romaji` converter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RomajiOptions {
    /// Overrides the chain-wide candidate cap.
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

/// Options for stages without settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoOptions {}

/// Name to factory mapping for chain stages.
#[derive(Default)]
pub struct Registry {
    normalizers: FxHashMap<String, NormalizerFactory>,
    converters: FxHashMap<String, ConverterFactory>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut normalizers: Vec<&String> = self.normalizers.keys().collect();
        let mut converters: Vec<&String> = self.converters.keys().collect();
        normalizers.sort();
        converters.sort();
        f.debug_struct("Registry")
            .field("normalizers", &normalizers)
            .field("converters", &converters)
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in stage.
    ///
    /// Normalizers: `full_width_to_half_width_alphabet`,
    /// `half_width_to_full_width_kana`, `transliterator`, `analyzer`.
    /// Converters: `katakana`, `romaji`, `analyzer`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_normalizer("full_width_to_half_width_alphabet", |_: NoOptions, _| {
            Ok(Arc::new(FullWidthToHalfWidthAlphabetNormalizer))
        });
        registry.register_normalizer("half_width_to_full_width_kana", |_: NoOptions, _| {
            Ok(Arc::new(HalfWidthToFullWidthKanaNormalizer))
        });
        registry.register_normalizer("transliterator", |opts: TransliteratorOptions, _| {
            Ok(Arc::new(TransliteratorNormalizer::from_id(&opts.id)?))
        });
        registry.register_normalizer("analyzer", |_: NoOptions, ctx| {
            Ok(Arc::new(AnalyzerNormalizer::new(Arc::clone(&ctx.analyzer))))
        });

        registry.register_converter("katakana", |_: NoOptions, ctx| {
            Ok(Arc::new(KatakanaConverter::new(Arc::clone(&ctx.analyzer))))
        });
        registry.register_converter("romaji", |opts: RomajiOptions, ctx| {
            let max = opts.max_candidates.unwrap_or(ctx.max_candidates);
            Ok(Arc::new(KatakanaToAlphabetConverter::new(max)))
        });
        registry.register_converter("analyzer", |_: NoOptions, ctx| {
            Ok(Arc::new(AnalyzerConverter::new(Arc::clone(&ctx.analyzer))))
        });

        registry
    }

    /// Registers a normalizer factory taking typed options `O`.
    pub fn register_normalizer<O, F>(&mut self, name: &str, factory: F)
    where
        O: DeserializeOwned,
        F: Fn(O, &BuildContext) -> Result<Arc<dyn Normalizer>> + Send + Sync + 'static,
    {
        let stage = name.to_string();
        self.normalizers.insert(
            name.to_string(),
            Box::new(move |raw: &Value, ctx: &BuildContext| factory(parse_options(&stage, raw)?, ctx)),
        );
    }

    /// Registers a converter factory taking typed options `O`.
    pub fn register_converter<O, F>(&mut self, name: &str, factory: F)
    where
        O: DeserializeOwned,
        F: Fn(O, &BuildContext) -> Result<Arc<dyn ReadingConverter>> + Send + Sync + 'static,
    {
        let stage = name.to_string();
        self.converters.insert(
            name.to_string(),
            Box::new(move |raw: &Value, ctx: &BuildContext| factory(parse_options(&stage, raw)?, ctx)),
        );
    }

    /// Returns true if a normalizer named `name` is registered.
    #[must_use]
    pub fn has_normalizer(&self, name: &str) -> bool {
        self.normalizers.contains_key(name)
    }

    /// Returns true if a converter named `name` is registered.
    #[must_use]
    pub fn has_converter(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Builds one normalizer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown names or invalid options.
    pub fn build_normalizer(&self, stage: &StageConfig, ctx: &BuildContext) -> Result<Arc<dyn Normalizer>> {
        let factory = self.normalizers.get(&stage.name).ok_or_else(|| ConfigError::UnknownStage {
            kind: "normalizer",
            name: stage.name.clone(),
        })?;
        factory(&Value::Object(stage.options.clone()), ctx)
    }

    /// Builds one converter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown names or invalid options.
    pub fn build_converter(&self, stage: &StageConfig, ctx: &BuildContext) -> Result<Arc<dyn ReadingConverter>> {
        let factory = self.converters.get(&stage.name).ok_or_else(|| ConfigError::UnknownStage {
            kind: "converter",
            name: stage.name.clone(),
        })?;
        factory(&Value::Object(stage.options.clone()), ctx)
    }

    /// Builds the normalizer chain described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any stage fails to build.
    pub fn build_normalizer_chain(&self, config: &ConversionConfig, ctx: &BuildContext) -> Result<NormalizerChain> {
        config
            .normalizers
            .iter()
            .try_fold(NormalizerChain::new(), |chain, stage| -> Result<NormalizerChain> {
                Ok(chain.with(self.build_normalizer(stage, ctx)?))
            })
    }

    /// Builds the converter chain described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any stage fails to build.
    pub fn build_converter_chain(&self, config: &ConversionConfig, ctx: &BuildContext) -> Result<ConverterChain> {
        config
            .converters
            .iter()
            .try_fold(ConverterChain::new(config.max_candidates), |chain, stage| -> Result<ConverterChain> {
                Ok(chain.with(self.build_converter(stage, ctx)?))
            })
    }
}

fn parse_options<O: DeserializeOwned>(stage: &str, raw: &Value) -> Result<O> {
    serde_json::from_value(raw.clone())
        .map_err(|e| Error::Config(format!("invalid options for stage '{stage}': {e}")))
}
