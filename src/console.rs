//! Line-oriented front end: reads operator commands, drives the terminal,
//! and prints frames to a writer.

use crate::backend::{Backend, Reply, TransportError};
use crate::interpret::Panels;
use crate::selector::{Preview, SelectorView};
use crate::snapshot::{ParkingSnapshot, ParkingTables};
use crate::terminal::{Frame, Phase, Renderer, Repoll, Terminal};
use crate::types::{ActionType, LabeledImage, UploadedFile};
use bytes::Bytes;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "Perintah:
  upload <file>          pilih file gambar baru
  labeled <path|nomor>   pilih gambar berlabel ('none' untuk batal)
  images                 tampilkan daftar gambar berlabel
  clear                  batalkan pilihan gambar
  in | out               proses kendaraan masuk / keluar
  refresh                muat ulang data parkir
  help                   tampilkan bantuan ini
  quit                   keluar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Labeled(String),
    Images,
    Clear,
    Submit(ActionType),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum CommandError {
    #[fail(display = "Perintah tidak dikenal: '{}'. Ketik 'help'.", _0)]
    Unknown(String),
    #[fail(display = "Perintah '{}' membutuhkan argumen.", _0)]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Command, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let argument = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };
        match word {
            "upload" => Ok(Command::Upload(PathBuf::from(argument("upload")?))),
            "labeled" => Ok(Command::Labeled(argument("labeled")?)),
            "images" => Ok(Command::Images),
            "clear" => Ok(Command::Clear),
            "in" => Ok(Command::Submit(ActionType::In)),
            "out" => Ok(Command::Submit(ActionType::Out)),
            "refresh" => Ok(Command::Refresh),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

enum Event {
    Submitted(Result<Reply, TransportError>),
    Polled(Result<ParkingSnapshot, TransportError>),
    Catalogue(Result<Vec<String>, TransportError>),
}

type Pending = FuturesUnordered<LocalBoxFuture<'static, Event>>;

/// Runs the terminal until `input` ends or the operator quits. Requests
/// still in flight at that point are awaited and handled before returning.
pub async fn run<B, R, I>(
    backend: B,
    terminal: &mut Terminal<R>,
    input: I,
) -> Result<(), failure::Error>
where
    B: Backend + Clone + 'static,
    R: Renderer,
    I: AsyncBufRead + Unpin,
{
    let mut pending = Pending::new();
    pending.push(load_catalogue(backend.clone()));
    pending.push(poll(backend.clone()));

    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if let ControlFlow::Break(()) =
                    handle_line(&line, &backend, terminal, &mut pending).await
                {
                    break;
                }
            }
            Some(event) = pending.next(), if !pending.is_empty() => {
                handle_event(event, &backend, terminal, &mut pending);
            }
        }
    }

    if let Phase::Submitting(action) = terminal.phase() {
        info!("Waiting for '{}' to finish", action);
    }
    if !pending.is_empty() {
        info!("Waiting for {} outstanding requests", pending.len());
    }
    while let Some(event) = pending.next().await {
        handle_event(event, &backend, terminal, &mut pending);
    }
    Ok(())
}

async fn handle_line<B, R>(
    line: &str,
    backend: &B,
    terminal: &mut Terminal<R>,
    pending: &mut Pending,
) -> ControlFlow<()>
where
    B: Backend + Clone + 'static,
    R: Renderer,
{
    if line.trim().is_empty() {
        return ControlFlow::Continue(());
    }
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(e) => {
            warn!("Bad command {:?}: {}", line, e);
            terminal.notice(&e.to_string());
            return ControlFlow::Continue(());
        }
    };
    match command {
        Command::Upload(path) => match read_upload(&path).await {
            Ok(file) => terminal.select_upload(file),
            Err(e) => {
                error!("Error reading {:?}: {}", path, e);
                terminal.show_error(format!("Gagal membaca file {}: {}", path.display(), e));
            }
        },
        Command::Labeled(choice) => {
            let path = resolve_labeled(&choice, terminal.catalogue());
            terminal.select_labeled(&path);
        }
        Command::Images => {
            let listing = catalogue_listing(terminal.catalogue());
            terminal.notice(&listing);
        }
        Command::Clear => terminal.clear_selection(),
        Command::Submit(action) => {
            if let Some(request) = terminal.begin_submission(action) {
                let backend = backend.clone();
                pending.push(
                    async move { Event::Submitted(backend.process_image(request).await) }
                        .boxed_local(),
                );
            }
        }
        Command::Refresh => pending.push(poll(backend.clone())),
        Command::Help => terminal.notice(HELP),
        Command::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn handle_event<B, R>(event: Event, backend: &B, terminal: &mut Terminal<R>, pending: &mut Pending)
where
    B: Backend + Clone + 'static,
    R: Renderer,
{
    match event {
        Event::Submitted(result) => {
            let Repoll = terminal.finish_submission(result);
            pending.push(poll(backend.clone()));
        }
        Event::Polled(result) => terminal.finish_poll(result),
        Event::Catalogue(result) => terminal.finish_labeled_images(result),
    }
}

fn poll<B: Backend + 'static>(backend: B) -> LocalBoxFuture<'static, Event> {
    async move { Event::Polled(backend.parking_data().await) }.boxed_local()
}

fn load_catalogue<B: Backend + 'static>(backend: B) -> LocalBoxFuture<'static, Event> {
    async move { Event::Catalogue(backend.labeled_images().await) }.boxed_local()
}

async fn read_upload(path: &Path) -> io::Result<UploadedFile> {
    let data = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile {
        name,
        bytes: Bytes::from(data),
    })
}

/// A 1-based catalogue number picks that entry; anything else is taken as a path.
fn resolve_labeled(choice: &str, catalogue: &[LabeledImage]) -> String {
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 && n <= catalogue.len() => catalogue[n - 1].path.clone(),
        _ => choice.to_string(),
    }
}

fn catalogue_listing(catalogue: &[LabeledImage]) -> String {
    if catalogue.is_empty() {
        return "Tidak ada gambar berlabel.".to_string();
    }
    let mut listing = String::from("Gambar berlabel:");
    for (i, image) in catalogue.iter().enumerate() {
        listing.push_str(&format!("\n  {}. {} ({})", i + 1, image.label, image.path));
    }
    listing
}

/// Prints only the parts of each frame that changed since the last one.
pub struct ConsoleRenderer<W> {
    out: W,
    last: Option<Frame>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> ConsoleRenderer<W> {
        ConsoleRenderer { out, last: None }
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        let last = self.last.as_ref();
        if last.map(|l| &l.selector) != Some(&frame.selector) {
            write_selector(&mut self.out, &frame.selector)?;
        }
        if last.map(|l| &l.catalogue) != Some(&frame.catalogue) {
            writeln!(self.out, "{}", catalogue_listing(&frame.catalogue))?;
        }
        if last.map(|l| &l.panels) != Some(&frame.panels) {
            write_panels(&mut self.out, &frame.panels)?;
        }
        if last.map(|l| &l.tables) != Some(&frame.tables) {
            write_tables(&mut self.out, &frame.tables)?;
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, frame: &Frame) {
        if let Err(e) = self.draw(frame) {
            error!("Error writing to console: {}", e);
        }
        self.last = Some(frame.clone());
    }

    fn notice(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            error!("Error writing to console: {}", e);
        }
    }
}

fn write_selector<W: Write>(out: &mut W, view: &SelectorView) -> io::Result<()> {
    writeln!(out, "Gambar: {}", view.upload_label)?;
    match &view.preview {
        Preview::Hidden => Ok(()),
        Preview::File(name) => writeln!(out, "Pratinjau: {}", name),
        Preview::Url(url) => writeln!(out, "Pratinjau: {}", url),
    }
}

fn write_panels<W: Write>(out: &mut W, panels: &Panels) -> io::Result<()> {
    if let Some(status) = &panels.status {
        writeln!(out, "[{}] {}", status.kind.as_str(), status.text)?;
    }
    if let Some(recognition) = &panels.recognition {
        writeln!(
            out,
            "Hasil deteksi: plat {} | jenis {} | waktu inferensi {}",
            recognition.plate, recognition.vehicle_type, recognition.inference_time
        )?;
    }
    if let Some(accuracy) = &panels.accuracy {
        writeln!(
            out,
            "Label: plat {} | jenis {}",
            accuracy.true_plate, accuracy.true_type
        )?;
        writeln!(
            out,
            "Akurasi: plat {} | jenis {} | keseluruhan {}",
            accuracy.plate_accuracy, accuracy.type_accuracy, accuracy.overall_accuracy
        )?;
        if !accuracy.message.is_empty() {
            writeln!(out, "Catatan akurasi: {}", accuracy.message)?;
        }
    }
    Ok(())
}

fn write_tables<W: Write>(out: &mut W, tables: &ParkingTables) -> io::Result<()> {
    let current: Vec<Vec<&str>> = tables
        .current
        .iter()
        .map(|r| vec![r.plate.as_str(), r.vehicle_type.as_str(), r.entry_time.as_str()])
        .collect();
    write_table(
        out,
        "Kendaraan Terparkir",
        &["Plat", "Jenis", "Waktu Masuk"],
        &current,
    )?;
    let history: Vec<Vec<&str>> = tables
        .history
        .iter()
        .map(|r| {
            vec![
                r.plate.as_str(),
                r.vehicle_type.as_str(),
                r.entry_time.as_str(),
                r.exit_time.as_str(),
                r.duration_minutes.as_str(),
                r.fee.as_str(),
            ]
        })
        .collect();
    write_table(
        out,
        "Riwayat Parkir",
        &[
            "Plat",
            "Jenis",
            "Waktu Masuk",
            "Waktu Keluar",
            "Durasi (menit)",
            "Biaya (Rp)",
        ],
        &history,
    )
}

fn write_table<W: Write>(
    out: &mut W,
    title: &str,
    headers: &[&str],
    rows: &[Vec<&str>],
) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    writeln!(out, "{} ({})", title, rows.len())?;
    write_row(out, headers, &widths)?;
    for row in rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[&str], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(out, "  {}", line.trim_end())
}
