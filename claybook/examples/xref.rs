use std::{fs, path::PathBuf};

use claybook::{read_xref_chain, ExistingPdf};
use nom_tracable::histogram;
use structopt::StructOpt;

/// Print the cross-reference chain and the page count of a PDF.
///
/// Build with `--features trace` to get a histogram of the parsers used.
#[derive(StructOpt, Debug)]
#[structopt(name = "claybook-xref")]
struct Opt {
    /// Input file
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,
}

pub fn main() {
    let opt = Opt::from_args();
    env_logger::init();

    let buf = match fs::read(&opt.input) {
        Ok(buf) => buf,
        Err(e) => {
            log::error!("Could not read {}: {}", opt.input.display(), e);
            return;
        }
    };

    let chain = match read_xref_chain(&buf) {
        Ok(chain) => chain,
        Err(e) => {
            log::error!("Error while parsing: {}", e);
            return;
        }
    };
    histogram();

    println!("startxref {}", chain.start_xref);
    println!("{:?}", chain.trailer);
    let mut offsets: Vec<_> = chain.offsets.iter().collect();
    offsets.sort();
    for (number, (offset, generation)) in offsets {
        println!("{:>6} {:>5} @ {}", number, generation, offset);
    }

    match ExistingPdf::from_bytes(buf).and_then(|pdf| pdf.page_tree()) {
        Ok((_, pages)) => println!("{} pages", pages.count),
        Err(e) => log::error!("Could not read the page tree: {}", e),
    }
}
