//! Command-line path queries over XML files.
//!
//! Parses each input file (or stdin), evaluates a compiled path
//! expression against it, and prints the matching elements -- their text
//! content by default, their serialized XML with `--xml`, or just the
//! match count with `--count`.

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;

use elemtree::{Document, NodeId, Path, XmlWriter};

/// xmlfind -- query XML documents with path expressions.
#[derive(Parser, Debug)]
#[command(name = "xmlfind", version, about, long_about = None)]
struct Cli {
    /// The path expression to evaluate (e.g. `.//book[@lang='en']/title`).
    path: String,

    /// XML files to query (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Print matched elements as serialized XML instead of their text.
    #[arg(long)]
    xml: bool,

    /// Print only the number of matches per file.
    #[arg(long)]
    count: bool,

    /// Prefix every line of output with the file name.
    #[arg(long)]
    with_filename: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let path = match Path::compile(&cli.path) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("xmlfind: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut worst_exit = EXIT_SUCCESS;
    for file in &cli.files {
        let exit = process_file(&cli, &path, file);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }

    ExitCode::from(worst_exit)
}

/// Queries a single input file and returns an exit code.
fn process_file(cli: &Cli, path: &Path, filename: &str) -> u8 {
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_ERROR;
        }
    };

    let doc = match Document::parse_str(&input) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_ERROR;
        }
    };

    let matches = doc.find_elements_path(doc.root(), path);

    if cli.count {
        print_line(cli, filename, &matches.len().to_string());
        return EXIT_SUCCESS;
    }

    for id in matches {
        let rendered = if cli.xml {
            serialize_element(&doc, id)
        } else {
            doc.text(id)
        };
        print_line(cli, filename, &rendered);
    }

    EXIT_SUCCESS
}

fn print_line(cli: &Cli, filename: &str, line: &str) {
    if cli.with_filename {
        println!("{filename}: {line}");
    } else {
        println!("{line}");
    }
}

/// Serializes a single element by cloning it into a scratch document.
fn serialize_element(doc: &Document, id: NodeId) -> String {
    let mut scratch = doc.clone();
    let root = scratch.root();
    let detached: Vec<NodeId> = scratch.children(root).collect();
    for child in detached {
        scratch.detach(child);
    }
    scratch.detach(id);
    scratch.append_child(root, id);
    XmlWriter::new().write_to_string(&scratch)
}

fn read_input(filename: &str) -> io::Result<String> {
    if filename == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(filename)
    }
}
