//! cpal-backed audio output.
//!
//! `cpal::Stream` is not `Send` on every platform, so the stream lives on a
//! dedicated thread that parks until the handle is dropped. The player only
//! keeps the opaque handle, which keeps the whole sink `Send`.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::player::{AudioBackend, AudioOutput, PlayerCore, OUTPUT_BUFFER_SAMPLES};
use crate::Error;

#[derive(Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> CpalBackend {
        CpalBackend
    }
}

struct CpalOutput {
    stop: Arc<(Mutex<bool>, Condvar)>,
    thread: Option<JoinHandle<()>>,
}

impl AudioOutput for CpalOutput {}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let (lock, cond) = &*self.stop;
        *lock.lock().unwrap() = true;
        cond.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl AudioBackend for CpalBackend {
    fn open(
        &mut self,
        sample_rate: u32,
        channels: u16,
        core: Arc<PlayerCore>,
    ) -> Result<Box<dyn AudioOutput>, Error> {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("audio-output".into())
            .spawn({
                let stop = Arc::clone(&stop);
                move || {
                    let stream = (|| {
                        let host = cpal::default_host();
                        let device = host
                            .default_output_device()
                            .ok_or_else(|| Error::Device("no default output device".into()))?;
                        let config = cpal::StreamConfig {
                            channels,
                            sample_rate: cpal::SampleRate(sample_rate),
                            buffer_size: cpal::BufferSize::Fixed(OUTPUT_BUFFER_SAMPLES as u32),
                        };
                        let stream = device
                            .build_output_stream(
                                &config,
                                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                                    core.consume(data);
                                },
                                |err| log::warn!("audio stream error: {err}"),
                                None,
                            )
                            .map_err(|e| Error::Device(e.to_string()))?;
                        stream.play().map_err(|e| Error::Device(e.to_string()))?;
                        Ok::<_, Error>(stream)
                    })();

                    match stream {
                        Ok(stream) => {
                            ready_tx.send(Ok(())).ok();
                            let (lock, cond) = &*stop;
                            let mut stopped = lock.lock().unwrap();
                            while !*stopped {
                                stopped = cond.wait(stopped).unwrap();
                            }
                            drop(stream);
                        }
                        Err(e) => {
                            ready_tx.send(Err(e)).ok();
                        }
                    }
                }
            })
            .map_err(|e| Error::Device(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalOutput { stop, thread: Some(thread) })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Device("audio output thread died".into()))
            }
        }
    }
}
