//! Transport adapter over any tokio async byte stream
//!
//! Useful for pseudo terminals, TCP serial bridges and scripted test doubles
//! such as `tokio_test::io::Mock`.

use crate::stream::StreamAccessor;
use async_trait::async_trait;
use sbd_core::{SbdError, SbdResult};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Stream transport that is already connected when constructed
#[derive(Debug)]
pub struct IoTransport<S> {
    stream: Option<S>,
    timeout: Option<Duration>,
}

impl<S> IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            timeout: None,
        }
    }

    /// Give the inner stream back, if it has not been closed
    pub fn into_inner(self) -> Option<S> {
        self.stream
    }

    fn stream_mut(&mut self) -> SbdResult<&mut S> {
        self.stream
            .as_mut()
            .ok_or_else(|| crate::stream::not_connected("Stream"))
    }
}

#[async_trait]
impl<S> StreamAccessor for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> SbdResult<()> {
        self.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> SbdResult<usize> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| SbdError::Timeout)?
                .map_err(SbdError::Transport),
            None => stream.read(buf).await.map_err(SbdError::Transport),
        }
    }

    async fn write(&mut self, buf: &[u8]) -> SbdResult<usize> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, stream.write(buf))
                .await
                .map_err(|_| SbdError::Timeout)?
                .map_err(SbdError::Transport),
            None => stream.write(buf).await.map_err(SbdError::Transport),
        }
    }

    async fn flush(&mut self) -> SbdResult<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(SbdError::Transport)
    }

    fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    async fn close(&mut self) -> SbdResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }
}
