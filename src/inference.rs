//! Registry of the precompiled statistical models used to fit populations.
//!
//! The registry is explicit configuration: it maps model names to their
//! source files. Compiling a model is delegated to a [`ModelCompiler`];
//! the resulting executable is treated as an opaque file that can be
//! removed again to force a rebuild.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("unknown model `{name}`, please choose one of: {available}")]
    UnknownModel { name: String, available: String },
    #[error("could not compile model `{name}`")]
    Compile {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not remove artifact of model `{name}`")]
    Clean {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Options passed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Build the model with support for within-chain threading.
    pub threads: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { threads: true }
    }
}

/// Turns a model source file into an executable.
pub trait ModelCompiler {
    /// Compile `source` and return the path of the produced executable.
    fn compile(&self, name: &str, source: &Path, options: &CompileOptions)
        -> anyhow::Result<PathBuf>;
}

/// Names of the available models and where their sources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    model_dir: PathBuf,
    models: IndexMap<String, PathBuf>,
}

impl ModelRegistry {
    /// An empty registry resolving source files relative to `model_dir`.
    pub fn new(model_dir: impl Into<PathBuf>) -> ModelRegistry {
        ModelRegistry {
            model_dir: model_dir.into(),
            models: IndexMap::new(),
        }
    }

    /// The models that ship with the pulse population fits.
    pub fn with_default_models(model_dir: impl Into<PathBuf>) -> ModelRegistry {
        ModelRegistry::new(model_dir).with_model("cpl_simple_chunked", "cpl_simple_chunked.stan")
    }

    pub fn with_model(mut self, name: impl Into<String>, file: impl Into<PathBuf>) -> ModelRegistry {
        self.models.insert(name.into(), file.into());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Look up a model by name.
    pub fn get_model(&self, name: &str) -> Result<InferenceModel, InferenceError> {
        let file = self
            .models
            .get(name)
            .ok_or_else(|| InferenceError::UnknownModel {
                name: name.to_string(),
                available: self.names().join(","),
            })?;
        Ok(InferenceModel {
            name: name.to_string(),
            source: self.model_dir.join(file),
            artifact: None,
        })
    }
}

/// A model from the registry and, once built, its executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceModel {
    name: String,
    source: PathBuf,
    artifact: Option<PathBuf>,
}

impl InferenceModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The executable, if the model was built.
    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    pub fn build(
        &mut self,
        compiler: &dyn ModelCompiler,
        options: &CompileOptions,
    ) -> Result<&Path, InferenceError> {
        let artifact = compiler
            .compile(&self.name, &self.source, options)
            .map_err(|source| InferenceError::Compile {
                name: self.name.clone(),
                source,
            })?;
        info!(model = %self.name, artifact = %artifact.display(), "built model");
        Ok(self.artifact.insert(artifact))
    }

    /// Delete the executable so that the next build compiles from scratch.
    /// Does nothing if the model was never built.
    pub fn clean(&mut self) -> Result<(), InferenceError> {
        let Some(artifact) = self.artifact.take() else {
            return Ok(());
        };
        match std::fs::remove_file(&artifact) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                self.artifact = Some(artifact);
                return Err(InferenceError::Clean {
                    name: self.name.clone(),
                    source,
                });
            }
        }
        info!(model = %self.name, "removed model artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;

    /// Pretends to compile by writing an empty file next to the source.
    struct TouchCompiler;

    impl ModelCompiler for TouchCompiler {
        fn compile(
            &self,
            name: &str,
            source: &Path,
            options: &CompileOptions,
        ) -> anyhow::Result<PathBuf> {
            if !options.threads {
                bail!("threads are required");
            }
            let exe = source.with_file_name(name);
            std::fs::write(&exe, b"")?;
            Ok(exe)
        }
    }

    #[test]
    fn lookup() {
        let registry = ModelRegistry::with_default_models("/models");
        let model = registry.get_model("cpl_simple_chunked").unwrap();
        assert_eq!(model.source(), Path::new("/models/cpl_simple_chunked.stan"));
        assert_eq!(model.artifact(), None);

        match registry.get_model("band") {
            Err(InferenceError::UnknownModel { name, available }) => {
                assert_eq!(name, "band");
                assert_eq!(available, "cpl_simple_chunked");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn build_and_clean() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let registry = ModelRegistry::with_default_models(dir.path());
        let mut model = registry.get_model("cpl_simple_chunked")?;

        let exe = model
            .build(&TouchCompiler, &CompileOptions::default())?
            .to_path_buf();
        assert!(exe.exists());
        assert_eq!(model.artifact(), Some(exe.as_path()));

        model.clean()?;
        assert!(!exe.exists());
        assert_eq!(model.artifact(), None);
        model.clean()?;

        let err = model
            .build(&TouchCompiler, &CompileOptions { threads: false })
            .unwrap_err();
        assert!(matches!(err, InferenceError::Compile { .. }));
        assert_eq!(model.artifact(), None);
        Ok(())
    }
}
