use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::debug;

/// Real-time audio output for processed PCM.
///
/// Writes are expected to block at roughly playback pace; the device is
/// owned by the playback worker for the whole run.
pub trait AudioOut: Send {
    fn write(&mut self, pcm: &[u8]) -> io::Result<()>;
}

/// PCM sink backed by a long-lived player child process. The child's stdin
/// pipe provides the real-time pacing.
pub struct Player {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Player {
    /// Spawn the first player found on PATH for mono s16le at `sample_rate`.
    pub fn spawn(sample_rate: u32) -> io::Result<Self> {
        let (binary, args) = player_command(sample_rate).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "no audio player (aplay or paplay) on PATH",
            )
        })?;
        debug!(player = %binary.display(), sample_rate, "starting audio output");
        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child.stdin.take();
        Ok(Self { child, stdin })
    }
}

impl AudioOut for Player {
    fn write(&mut self, pcm: &[u8]) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(pipe) => pipe.write_all(pcm),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "player stdin closed",
            )),
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // closing stdin lets the child drain buffered audio and exit
        self.stdin.take();
        let _ = self.child.wait();
    }
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.exists())
}

fn player_command(sample_rate: u32) -> Option<(PathBuf, Vec<String>)> {
    if let Some(aplay) = find_on_path("aplay") {
        let args = ["-q", "-t", "raw", "-f", "S16_LE", "-c", "1", "-r"]
            .iter()
            .map(|s| s.to_string())
            .chain([sample_rate.to_string()])
            .collect();
        return Some((aplay, args));
    }
    if let Some(paplay) = find_on_path("paplay") {
        let args = vec![
            "--raw".to_string(),
            "--format=s16le".to_string(),
            "--channels=1".to_string(),
            format!("--rate={sample_rate}"),
        ];
        return Some((paplay, args));
    }
    None
}
