//! `yt-dlp` process driver

use std::ffi::{OsStr, OsString};
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{DownloadOptions, MediaRetriever, PostProcessor, RetrievalError, VideoMetadata};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `yt-dlp` as a child process. Every call blocks until the process exits
/// or the options' deadline passes, in which case the child is killed.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

struct ProcessOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

enum RunFailure {
    Spawn(std::io::Error),
    Wait(std::io::Error),
    TimedOut,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            program: binary.into(),
            leading_args: Vec::new(),
        }
    }

    /// Invokes yt-dlp through another program, e.g. `python3 -m yt_dlp`.
    /// Driven by `retriever.args`.
    pub fn with_args<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn metadata_args(&self, url: &str, options: &DownloadOptions) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        push_all(&mut args, ["--dump-single-json", "--skip-download"]);
        self.push_common(&mut args, options);
        push_all(&mut args, ["--", url]);
        args
    }

    pub fn download_args(&self, url: &str, options: &DownloadOptions) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        push_all(&mut args, ["-f", options.format.as_str(), "-o"]);
        args.push(options.output_template.clone().into_os_string());
        push_all(&mut args, ["--no-progress", "--quiet", "--http-chunk-size"]);
        args.push(options.http_chunk_size.to_string().into());
        self.push_common(&mut args, options);

        // `--embed-thumbnail` fetches the image itself and discards it afterwards;
        // adding `--write-thumbnail` would keep it on disk.
        for processor in options.post_processors() {
            match processor {
                PostProcessor::EmbedThumbnail => args.push("--embed-thumbnail".into()),
            }
        }

        push_all(&mut args, ["--", url]);
        args
    }

    fn push_common(&self, args: &mut Vec<OsString>, options: &DownloadOptions) {
        push_all(args, ["--no-warnings", "--no-playlist"]);

        if let Some(cookie_file) = &options.cookie_file {
            // Read-only input; a missing file only means anonymous requests.
            if cookie_file.is_file() {
                args.push("--cookies".into());
                args.push(cookie_file.clone().into_os_string());
            } else {
                debug!(path = %cookie_file.display(), "Cookie file not present, skipping");
            }
        }
        if let Some(ffmpeg) = &options.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }
    }

    fn run(&self, args: Vec<OsString>, deadline: Option<Instant>) -> Result<ProcessOutput, RunFailure> {
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a deadline also reaches ffmpeg and other helpers.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command.spawn().map_err(RunFailure::Spawn)?;

        // Drain both pipes concurrently so a chatty child cannot fill one and stall.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || drain(stdout));
        let stderr_reader = thread::spawn(move || drain(stderr));

        let status = loop {
            if let Some(status) = child.try_wait().map_err(RunFailure::Wait)? {
                break status;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(program = %self.program.display(), "Deadline passed, killing retriever process");
                kill_tree(&mut child);
                let _ = child.wait();
                // Pipes close once the whole group is gone.
                let _ = stdout_reader.join();
                let _ = stderr_reader.join();
                return Err(RunFailure::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ProcessOutput {
            status,
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
        })
    }

    fn failure(&self, failure: RunFailure, layer: fn(String) -> RetrievalError) -> RetrievalError {
        match failure {
            RunFailure::Spawn(e) if e.kind() == ErrorKind::NotFound => RetrievalError::Unexpected(
                format!("{} is not installed", self.program.display()),
            ),
            RunFailure::Spawn(e) => RetrievalError::Unexpected(format!(
                "failed to start {}: {e}",
                self.program.display()
            )),
            RunFailure::Wait(e) => RetrievalError::Unexpected(format!(
                "failed to wait for {}: {e}",
                self.program.display()
            )),
            RunFailure::TimedOut => layer("retrieval timed out".to_string()),
        }
    }
}

impl MediaRetriever for YtDlp {
    fn extract_metadata(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<VideoMetadata, RetrievalError> {
        let output = self
            .run(self.metadata_args(url, options), options.deadline)
            .map_err(|f| self.failure(f, RetrievalError::Extractor))?;

        if !output.status.success() {
            return Err(RetrievalError::Extractor(error_message(
                &output.stderr,
                output.status,
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            RetrievalError::Unexpected(format!("unreadable metadata from retriever: {e}"))
        })
    }

    fn download(&self, url: &str, options: &DownloadOptions) -> Result<(), RetrievalError> {
        let output = self
            .run(self.download_args(url, options), options.deadline)
            .map_err(|f| self.failure(f, RetrievalError::Download))?;

        if !output.status.success() {
            return Err(RetrievalError::Download(error_message(
                &output.stderr,
                output.status,
            )));
        }

        Ok(())
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: signals only the process group created for this child.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn push_all<'a>(args: &mut Vec<OsString>, items: impl IntoIterator<Item = &'a str>) {
    args.extend(items.into_iter().map(|item| OsStr::new(item).to_os_string()));
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Picks the most useful line of stderr: the last `ERROR:` line, else the last
/// non-empty line.
fn error_message(stderr: &[u8], status: ExitStatus) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| format!("yt-dlp exited with {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn options(embed_thumbnail: bool) -> DownloadOptions {
        DownloadOptions::builder()
            .format("140/bestaudio")
            .output_template("/tmp/ytaudio_x.%(ext)s")
            .http_chunk_size(10_485_760)
            .embed_thumbnail(embed_thumbnail)
            .build()
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    /// Retriever backed by an inline shell script instead of yt-dlp
    fn scripted(script: &str) -> YtDlp {
        YtDlp::with_args("sh", ["-c", script, "yt-dlp"])
    }

    #[test]
    fn test_download_args_without_thumbnail() {
        let args = strings(&YtDlp::new("yt-dlp").download_args(URL, &options(false)));

        assert_eq!(&args[..4], &["-f", "140/bestaudio", "-o", "/tmp/ytaudio_x.%(ext)s"]);
        assert!(args.contains(&"--http-chunk-size".to_string()));
        assert!(args.contains(&"10485760".to_string()));
        assert!(!args.contains(&"--write-thumbnail".to_string()));
        assert!(!args.contains(&"--embed-thumbnail".to_string()));
        assert_eq!(&args[args.len() - 2..], &["--", URL]);
    }

    #[test]
    fn test_download_args_with_thumbnail() {
        let args = strings(&YtDlp::new("yt-dlp").download_args(URL, &options(true)));

        assert!(args.contains(&"--embed-thumbnail".to_string()));
        assert!(!args.contains(&"--write-thumbnail".to_string()));
    }

    #[test]
    fn test_cookie_file_only_passed_when_present() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let cookie = temp_dir.path().join("cookie.txt");

        let mut opts = options(false);
        opts.cookie_file = Some(cookie.clone());
        let args = strings(&YtDlp::new("yt-dlp").metadata_args(URL, &opts));
        assert!(!args.contains(&"--cookies".to_string()));

        std::fs::write(&cookie, "# Netscape HTTP Cookie File\n").unwrap();
        let args = strings(&YtDlp::new("yt-dlp").metadata_args(URL, &opts));
        assert!(args.contains(&"--cookies".to_string()));
        assert!(args.contains(&cookie.to_string_lossy().into_owned()));
    }

    #[test]
    fn test_metadata_args_skip_download() {
        let mut opts = options(false);
        opts.ffmpeg_location = Some(Path::new("/usr/bin/ffmpeg").to_path_buf());
        let args = strings(&YtDlp::with_args("python3", ["-m", "yt_dlp"]).metadata_args(URL, &opts));

        assert_eq!(&args[..4], &["-m", "yt_dlp", "--dump-single-json", "--skip-download"]);
        assert!(args.contains(&"--ffmpeg-location".to_string()));
        assert!(!args.contains(&"-o".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_error_message_prefers_error_lines() {
        let stderr = b"WARNING: something\nERROR: [youtube] abc: Private video\n\n";
        let status = std::process::Command::new("sh")
            .args(["-c", "exit 1"])
            .status()
            .unwrap();
        assert_eq!(error_message(stderr, status), "ERROR: [youtube] abc: Private video");
        assert_eq!(error_message(b"plain failure\n", status), "plain failure");
        assert!(error_message(b"", status).starts_with("yt-dlp exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_metadata_parses_json() {
        let retriever = scripted(r#"echo '{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","duration":213}'"#);
        let meta = retriever.extract_metadata(URL, &options(false)).unwrap();

        assert_eq!(meta.id, "dQw4w9WgXcQ");
        assert_eq!(meta.title.as_deref(), Some("Never Gonna Give You Up"));
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_metadata_failure_is_extractor_error() {
        let retriever = scripted("echo 'ERROR: [youtube] abc: Private video' >&2; exit 1");
        let err = retriever.extract_metadata(URL, &options(false)).unwrap_err();

        assert!(matches!(err, RetrievalError::Extractor(_)));
        assert!(err.message().contains("Private video"));
    }

    #[cfg(unix)]
    #[test]
    fn test_download_writes_through_process() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("out.m4a");
        // `$4` is the output template: yt-dlp -f FORMAT -o TEMPLATE ...
        let retriever = scripted(r#"printf 'audio' > "$(echo "$4" | sed 's/%(ext)s/m4a/')""#);

        let mut opts = options(false);
        opts.output_template = temp_dir.path().join("out.%(ext)s");
        retriever.download(URL, &opts).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"audio");
    }

    #[cfg(unix)]
    #[test]
    fn test_deadline_kills_process() {
        let retriever = scripted("sleep 10");
        let mut opts = options(false);
        opts.deadline = Some(Instant::now() + Duration::from_millis(200));

        let started = Instant::now();
        let err = retriever.download(URL, &opts).unwrap_err();

        assert!(matches!(err, RetrievalError::Download(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_deadline_kills_helper_processes() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let late = temp_dir.path().join("out.temp.m4a");
        // A helper that outlives the deadline and writes late, like ffmpeg would
        let retriever = scripted(&format!(
            "(sleep 0.5; printf late > '{}') & sleep 10",
            late.display()
        ));
        let mut opts = options(false);
        opts.deadline = Some(Instant::now() + Duration::from_millis(150));

        let started = Instant::now();
        let err = retriever.download(URL, &opts).unwrap_err();
        assert!(matches!(err, RetrievalError::Download(_)));
        assert!(started.elapsed() < Duration::from_secs(5));

        std::thread::sleep(Duration::from_millis(800));
        assert!(!late.exists());
    }

    #[test]
    fn test_missing_binary_is_unexpected() {
        let retriever = YtDlp::new("/nonexistent/yt-dlp-binary");
        let err = retriever.extract_metadata(URL, &options(false)).unwrap_err();
        assert!(matches!(err, RetrievalError::Unexpected(_)));
    }
}
