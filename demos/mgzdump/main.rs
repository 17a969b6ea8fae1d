//! An application for reading MGH/MGZ file meta-data.

use mgz_optimize::intent::describe;
use mgz_optimize::{IntentCode, MghObject};
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to MGH/MGZ file is required");
    let obj = MghObject::from_file(filename).expect("Failed to read MGH file");
    println!("{:#?}", obj.header());
    println!("storage type: {:?}", obj.data_type());
    println!("intent: {}", describe(obj.intent().map(IntentCode)));

    let trailer = obj.trailer();
    if let Some(p) = trailer.scan_parameters() {
        println!("{:#?}", p);
    }
    for tag in trailer {
        println!("tag {} ({} bytes)", tag.id(), tag.data().len());
    }
    if !trailer.tail().is_empty() {
        println!("unparsed trailer: {} bytes", trailer.tail().len());
    }
}
