//! The synthesis engine: chunking, merge and the degraded path.

use std::path::{Path, PathBuf};

use newscast_core::{MergePolicy, TtsSettings};
use tokio::fs;
use tracing::{info, warn};

use crate::backend::{SynthesisBackend, backend_for};
use crate::clean::{clean_markup, split_paragraphs};
use crate::concat::{AudioConcat, FfmpegConcat};
use crate::error::{Result, TtsError};

/// The finished audio file.
///
/// `truncated` marks the degraded path: the artifact holds only the first
/// chunk because no merge capability was available.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub chunks: usize,
    pub truncated: bool,
}

/// Synthesizes a script into one audio artifact.
pub struct SpeechSynthesizer {
    backend: Box<dyn SynthesisBackend>,
    concat: Option<Box<dyn AudioConcat>>,
    merge_policy: MergePolicy,
}

impl SpeechSynthesizer {
    /// Assemble an engine from explicit parts. The concat capability is an
    /// `Option` so its absence is part of the engine's state, not a runtime
    /// surprise.
    pub fn new(
        backend: Box<dyn SynthesisBackend>,
        concat: Option<Box<dyn AudioConcat>>,
        merge_policy: MergePolicy,
    ) -> Self {
        Self {
            backend,
            concat,
            merge_policy,
        }
    }

    /// Resolve the configured backend and probe for ffmpeg once.
    pub async fn from_settings(settings: &TtsSettings) -> Result<Self> {
        let backend = backend_for(settings).await?;
        let concat = FfmpegConcat::detect()
            .await
            .map(|c| Box::new(c) as Box<dyn AudioConcat>);
        if concat.is_none() {
            warn!("ffmpeg not found, long scripts will follow the merge policy degraded path");
        }
        Ok(Self::new(backend, concat, settings.merge_policy))
    }

    /// Synthesize `text` into an audio file at `output`.
    ///
    /// Text within the backend's per-call limit is synthesized in one call;
    /// longer text is split on paragraph boundaries and re-merged in order.
    pub async fn synthesize(&self, text: &str, output: &Path) -> Result<AudioArtifact> {
        let cleaned = clean_markup(text);
        if cleaned.is_empty() {
            return Err(TtsError::EmptyInput);
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let chars = cleaned.chars().count();
        if chars <= self.backend.max_chunk_chars() {
            let tmp = working_path(output);
            self.backend.synthesize(&cleaned, &tmp).await?;
            fs::rename(&tmp, output).await?;
            info!(engine = self.backend.name(), path = %output.display(), "audio generated");
            return Ok(AudioArtifact {
                path: output.to_path_buf(),
                chunks: 1,
                truncated: false,
            });
        }

        warn!(
            chars,
            limit = self.backend.max_chunk_chars(),
            "text exceeds per-call limit, synthesizing per paragraph"
        );
        self.synthesize_chunked(&cleaned, output).await
    }

    async fn synthesize_chunked(&self, cleaned: &str, output: &Path) -> Result<AudioArtifact> {
        let paragraphs = split_paragraphs(cleaned);
        let extension = output
            .extension()
            .map_or_else(|| "mp3".to_string(), |e| e.to_string_lossy().to_string());

        let mut chunk_files: Vec<PathBuf> = Vec::new();
        for (i, paragraph) in paragraphs.iter().enumerate() {
            let chunk_path = PathBuf::from(format!("{}.part{i}.{extension}", output.display()));
            if let Err(err) = self.backend.synthesize(paragraph, &chunk_path).await {
                remove_files(&chunk_files).await;
                return Err(err);
            }
            chunk_files.push(chunk_path);
        }

        if chunk_files.len() == 1 {
            fs::rename(&chunk_files[0], output).await?;
            info!(engine = self.backend.name(), path = %output.display(), "audio generated");
            return Ok(AudioArtifact {
                path: output.to_path_buf(),
                chunks: 1,
                truncated: false,
            });
        }

        match &self.concat {
            Some(concat) => {
                let tmp = working_path(output);
                if let Err(err) = concat.concat(&chunk_files, &tmp).await {
                    remove_files(&chunk_files).await;
                    return Err(err);
                }
                fs::rename(&tmp, output).await?;
                remove_files(&chunk_files).await;
                info!(
                    engine = self.backend.name(),
                    chunks = chunk_files.len(),
                    path = %output.display(),
                    "audio merged"
                );
                Ok(AudioArtifact {
                    path: output.to_path_buf(),
                    chunks: chunk_files.len(),
                    truncated: false,
                })
            }
            None => match self.merge_policy {
                MergePolicy::FirstChunk => {
                    warn!(
                        dropped = chunk_files.len() - 1,
                        "audio merge unavailable, substituting first chunk"
                    );
                    fs::rename(&chunk_files[0], output).await?;
                    remove_files(&chunk_files[1..]).await;
                    Ok(AudioArtifact {
                        path: output.to_path_buf(),
                        chunks: chunk_files.len(),
                        truncated: true,
                    })
                }
                MergePolicy::Fail => {
                    remove_files(&chunk_files).await;
                    Err(TtsError::MergeUnavailable)
                }
            },
        }
    }
}

fn working_path(output: &Path) -> PathBuf {
    PathBuf::from(format!("{}.tmp", output.display()))
}

async fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct MockBackend {
        limit: usize,
        calls: Arc<Mutex<Vec<String>>>,
        fail_on_call: Option<usize>,
    }

    impl MockBackend {
        fn new(limit: usize) -> (Box<Self>, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Box::new(Self {
                    limit,
                    calls: calls.clone(),
                    fail_on_call: None,
                }),
                calls,
            )
        }

        fn failing_on(limit: usize, call: usize) -> Box<Self> {
            Box::new(Self {
                limit,
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_on_call: Some(call),
            })
        }
    }

    #[async_trait]
    impl SynthesisBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn max_chunk_chars(&self) -> usize {
            self.limit
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
            let call_index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(text.to_string());
                calls.len() - 1
            };
            if self.fail_on_call == Some(call_index) {
                return Err(TtsError::Synthesis("mock chunk failure".to_string()));
            }
            fs::write(output, text.as_bytes()).await?;
            Ok(())
        }
    }

    struct MockConcat {
        inputs: Arc<Mutex<Vec<Vec<PathBuf>>>>,
    }

    impl MockConcat {
        fn new() -> (Box<Self>, Arc<Mutex<Vec<Vec<PathBuf>>>>) {
            let inputs = Arc::new(Mutex::new(Vec::new()));
            (
                Box::new(Self {
                    inputs: inputs.clone(),
                }),
                inputs,
            )
        }
    }

    #[async_trait]
    impl AudioConcat for MockConcat {
        async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
            self.inputs.lock().unwrap().push(inputs.to_vec());
            let mut merged = Vec::new();
            for input in inputs {
                merged.extend(fs::read(input).await?);
            }
            fs::write(output, merged).await?;
            Ok(())
        }
    }

    fn leftover_files(dir: &TempDir, keep: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p != keep)
            .collect()
    }

    #[tokio::test]
    async fn short_text_is_one_call() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let (backend, calls) = MockBackend::new(100);
        let engine = SpeechSynthesizer::new(backend, None, MergePolicy::FirstChunk);

        let artifact = engine.synthesize("短文本", &output).await.unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(artifact.chunks, 1);
        assert!(!artifact.truncated);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "短文本");
        assert!(leftover_files(&dir, &output).is_empty());
    }

    #[tokio::test]
    async fn long_text_synthesizes_each_paragraph_and_merges_in_order() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let (backend, calls) = MockBackend::new(10);
        let (concat, concat_inputs) = MockConcat::new();
        let engine = SpeechSynthesizer::new(backend, Some(concat), MergePolicy::FirstChunk);

        let text = "第一段内容比较长\n\n第二段内容比较长\n\n第三段内容比较长";
        let artifact = engine.synthesize(text, &output).await.unwrap();

        let recorded = calls.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec!["第一段内容比较长", "第二段内容比较长", "第三段内容比较长"]
        );
        assert_eq!(artifact.chunks, 3);
        assert!(!artifact.truncated);

        // The merge received the chunk files in paragraph order.
        let inputs = concat_inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0][0].to_string_lossy().contains(".part0."));
        assert!(inputs[0][1].to_string_lossy().contains(".part1."));
        assert!(inputs[0][2].to_string_lossy().contains(".part2."));

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "第一段内容比较长第二段内容比较长第三段内容比较长"
        );
        assert!(leftover_files(&dir, &output).is_empty());
    }

    #[tokio::test]
    async fn missing_concat_substitutes_first_chunk() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let (backend, calls) = MockBackend::new(10);
        let engine = SpeechSynthesizer::new(backend, None, MergePolicy::FirstChunk);

        let text = "第一段内容比较长\n\n第二段内容比较长\n\n第三段内容比较长";
        let artifact = engine.synthesize(text, &output).await.unwrap();

        assert_eq!(calls.lock().unwrap().len(), 3);
        assert_eq!(artifact.chunks, 3);
        assert!(artifact.truncated);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "第一段内容比较长");
        assert!(leftover_files(&dir, &output).is_empty());
    }

    #[tokio::test]
    async fn missing_concat_with_fail_policy_is_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let (backend, _calls) = MockBackend::new(10);
        let engine = SpeechSynthesizer::new(backend, None, MergePolicy::Fail);

        let text = "第一段内容比较长\n\n第二段内容比较长";
        let err = engine.synthesize(text, &output).await.unwrap_err();

        assert!(matches!(err, TtsError::MergeUnavailable));
        assert!(!output.exists());
        assert!(leftover_files(&dir, &output).is_empty());
    }

    #[tokio::test]
    async fn chunk_failure_fails_whole_operation() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let backend = MockBackend::failing_on(10, 1);
        let engine = SpeechSynthesizer::new(backend, None, MergePolicy::FirstChunk);

        let text = "第一段内容比较长\n\n第二段内容比较长\n\n第三段内容比较长";
        let err = engine.synthesize(text, &output).await.unwrap_err();

        assert!(matches!(err, TtsError::Synthesis(_)));
        assert!(!output.exists());
        assert!(leftover_files(&dir, &output).is_empty());
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let (backend, _calls) = MockBackend::new(100);
        let engine = SpeechSynthesizer::new(backend, None, MergePolicy::FirstChunk);

        assert!(matches!(
            engine.synthesize("", Path::new("out.mp3")).await,
            Err(TtsError::EmptyInput)
        ));
        // Markup-only input cleans down to nothing.
        assert!(matches!(
            engine.synthesize("## \n\n** **", Path::new("out.mp3")).await,
            Err(TtsError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn markup_is_stripped_before_synthesis() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp3");
        let (backend, calls) = MockBackend::new(100);
        let engine = SpeechSynthesizer::new(backend, None, MergePolicy::FirstChunk);

        engine.synthesize("**重要**新闻", &output).await.unwrap();

        assert_eq!(calls.lock().unwrap()[0], "重要新闻");
    }
}
