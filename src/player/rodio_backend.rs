//! rodio-based engine: fetch the whole stream over HTTP, decode in memory,
//! feed a sink. Catalog streams are single songs at 64/128 kbps, so whole-
//! file buffering stays small and makes seeking reliable.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::debug;

use super::backend::AudioBackend;

pub struct RodioBackend {
    // Dropping the stream kills the output device, so it rides along unused
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    client: reqwest::Client,
    sink: Option<Sink>,
    track_duration: Option<Duration>,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().context("no audio output device available")?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            client: reqwest::Client::new(),
            sink: None,
            track_duration: None,
        })
    }
}

#[async_trait(?Send)]
impl AudioBackend for RodioBackend {
    async fn load(&mut self, url: &str) -> Result<()> {
        debug!("fetching stream {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching {url}"))?
            .error_for_status()
            .context("stream request rejected")?;
        let bytes = response.bytes().await.context("reading stream body")?;
        debug!("buffered {} bytes", bytes.len());

        let source =
            Decoder::new(Cursor::new(bytes)).context("unsupported or corrupted stream")?;
        self.track_duration = source.total_duration();

        if let Some(old) = self.sink.take() {
            old.stop();
        }
        let sink = Sink::try_new(&self.stream_handle).context("opening audio sink")?;
        sink.append(source);
        sink.pause();
        self.sink = Some(sink);
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.try_seek(position)
                .map_err(|e| anyhow::anyhow!("seek failed: {e}"))?;
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map(|s| s.get_pos()).unwrap_or_default()
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn is_finished(&self) -> bool {
        self.sink
            .as_ref()
            .map(|sink| sink.empty())
            .unwrap_or(true)
    }
}
