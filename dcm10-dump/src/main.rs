//! `dcm-dump`: dumps the File Meta Information and main Data Set of a DICOM
//! Part 10 file. An external collaborator of the `dcm10` library per
//! `spec.md` §1 — its only use of the library is a printable walk of the
//! data set.

use clap::Parser;

use dcm10::{DicomFile, ErrorDetail, LogLevel};

#[derive(Parser)]
#[command(
  name = "dcm-dump",
  bin_name = "dcm-dump",
  version,
  about = "Dumps the content of a DICOM Part 10 file"
)]
struct Cli {
  /// Raise the log level to info.
  #[arg(short = 'v', long = "verbose")]
  verbose: bool,

  file_path: String,
}

fn main() {
  let cli = Cli::parse();

  if cli.verbose {
    dcm10::log::set_level(LogLevel::Info);
  }

  match dump(&cli.file_path) {
    Ok(()) => std::process::exit(0),
    Err(e) => {
      e.print(&format!("dumping file \"{}\"", cli.file_path));
      std::process::exit(1);
    }
  }
}

fn dump(file_path: &str) -> Result<(), dcm10::Error> {
  let mut file = DicomFile::open(file_path)?;

  let file_meta = file.read_file_meta()?;
  dcm10::log::info("File Meta Information:");
  file_meta.print(1);

  let metadata = file.read_metadata()?;
  dcm10::log::info("Data Set:");
  metadata.print(1);

  file.close();
  Ok(())
}
