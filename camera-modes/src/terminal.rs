//! A [`Presenter`] driven from the terminal.
//!
//! Commands are read line by line from stdin on a background thread:
//!
//! - `<mode name>` switches mode
//! - `set <param> <value>` adjusts a slider, e.g. `set red_gain 1.3`
//! - `snap` saves the next processed frame
//! - `quit` stops the loop

use crate::{
    session::{Command, Presenter},
    snapshot::Artifact,
};
use crossbeam::channel::{Receiver, unbounded};
use image::RgbImage;
use image_effect::Frame;
use std::{
    io::{self, BufRead},
    path::PathBuf,
    thread,
};

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let command = match line.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Command::Stop,
        "s" | "snap" | "snapshot" => Command::Snapshot,
        lower if lower.starts_with("set ") => {
            let mut parts = line.split_whitespace().skip(1);
            match (parts.next(), parts.next().map(str::parse::<f32>), parts.next()) {
                (Some(key), Some(Ok(value)), None) => Command::SetParam {
                    key: key.to_string(),
                    value,
                },
                _ => Command::Unknown(line.to_string()),
            }
        }
        _ => Command::SelectMode(line.to_string()),
    };

    Some(command)
}

pub struct TerminalPresenter {
    commands: Receiver<Command>,
    preview: Option<PathBuf>,
    frames: u64,
}

impl TerminalPresenter {
    /// Starts reading commands from stdin. When `preview` is set every shown
    /// frame is written there as PNG.
    pub fn new(preview: Option<PathBuf>) -> Self {
        let (tx, rx) = unbounded();

        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };

                if let Some(command) = parse_command(&line)
                    && tx.send(command).is_err()
                {
                    break;
                }
            }
            log::debug!("stdin closed");
        });

        Self::with_receiver(rx, preview)
    }

    pub fn with_receiver(commands: Receiver<Command>, preview: Option<PathBuf>) -> Self {
        Self {
            commands,
            preview,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for TerminalPresenter {
    fn poll(&mut self) -> Vec<Command> {
        self.commands.try_iter().collect()
    }

    fn show(&mut self, frame: &Frame) {
        self.frames += 1;
        log::trace!("frame {} {}x{}", self.frames, frame.width(), frame.height());

        if let Some(path) = &self.preview
            && let Err(e) = frame.to_rgb_image().save(path)
        {
            log::warn!("write preview {} failed: {e}", path.display());
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn captured(&mut self, artifact: &Artifact, thumbnail: Option<&RgbImage>) {
        match thumbnail {
            Some(thumb) => println!(
                "saved {} (thumbnail {}x{})",
                artifact.path.display(),
                thumb.width(),
                thumb.height()
            ),
            None => println!("saved {}", artifact.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("QUIT"), Some(Command::Stop));
        assert_eq!(parse_command("snap"), Some(Command::Snapshot));
        assert_eq!(
            parse_command("Night Mode"),
            Some(Command::SelectMode("Night Mode".to_string()))
        );
        assert_eq!(
            parse_command("set red_gain 1.25"),
            Some(Command::SetParam {
                key: "red_gain".to_string(),
                value: 1.25
            })
        );
        assert_eq!(
            parse_command("set red_gain lots"),
            Some(Command::Unknown("set red_gain lots".to_string()))
        );
    }

    #[test]
    fn test_poll_drains_channel() {
        let (tx, rx) = unbounded();
        let mut presenter = TerminalPresenter::with_receiver(rx, None);

        tx.send(Command::Snapshot).unwrap();
        tx.send(Command::Stop).unwrap();

        assert_eq!(presenter.poll(), vec![Command::Snapshot, Command::Stop]);
        assert!(presenter.poll().is_empty());
    }

    #[test]
    fn test_preview_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.png");
        let (_tx, rx) = unbounded();
        let mut presenter = TerminalPresenter::with_receiver(rx, Some(path.clone()));

        presenter.show(&Frame::from_rgb(RgbImage::from_pixel(4, 3, Rgb([9, 8, 7]))));

        assert_eq!(presenter.frames(), 1);
        assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (4, 3));
    }
}
