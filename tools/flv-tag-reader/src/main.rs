use rml_flv::tags::{FlvDeserializer, FlvTag, FlvTagType, ScriptDataValue};
use rml_flv::tags::{FILE_HEADER_SIZE, PREVIOUS_TAG_SIZE_LENGTH, TAG_HEADER_SIZE};
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use tracing::{debug, info};

const MAX_PRINTED_BYTES: usize = 100;

fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .try_init();

    println!("FLV tag reader");
    println!("This reads the tags of an FLV file, such as one written by a muxer session,");
    println!("and prints their headers.  Pass --step to pause after every tag.");
    println!();

    let args: Vec<String> = env::args().skip(1).collect();
    let step = args.iter().any(|arg| arg == "--step");
    let file_name = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(file_name) => file_name.clone(),
        None => {
            println!("No file specified to read.  Pass the path to the file you wish to read");
            return Ok(());
        }
    };

    info!(file = %file_name, "Reading file");

    let mut file = File::open(&file_name)?;
    let mut deserializer = FlvDeserializer::new();
    let mut buffer = [0_u8; 4096];
    let mut tag_number = 1;
    let mut tag_offset = FILE_HEADER_SIZE + PREVIOUS_TAG_SIZE_LENGTH;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            println!("Finished reading file after {} tags", tag_number - 1);
            return Ok(());
        }

        debug!(bytes = bytes_read, "Read chunk");

        let mut input = &buffer[..bytes_read];
        while let Some(tag) = deserializer.get_next_tag(input)? {
            input = &[];

            if tag_number == 1 {
                if let Some(header) = deserializer.header() {
                    println!(
                        "Header {{ version: {}, has_audio: {}, has_video: {} }}",
                        header.version, header.has_audio, header.has_video
                    );
                    println!();
                }
            }

            println!(
                "Tag: {}   Timestamp: {}   Type: {:?}   Size: {}   index: {} ({:x})",
                tag_number,
                tag.timestamp,
                tag.tag_type,
                tag.data.len(),
                tag_offset,
                tag_offset
            );

            print_tag(&tag)?;
            println!();

            if step {
                println!("Press enter to read next tag");
                let mut line = String::new();
                std::io::stdin().read_line(&mut line)?;
            }

            tag_number += 1;
            tag_offset += TAG_HEADER_SIZE + tag.data.len() + PREVIOUS_TAG_SIZE_LENGTH;
        }
    }
}

fn print_tag(tag: &FlvTag) -> Result<(), Box<dyn Error>> {
    match tag.tag_type {
        FlvTagType::Video => match tag.video_header() {
            Some(header) => {
                println!(
                    "Video {{ frame_type: {}, codec_id: {}, packet_type: {:?}, composition_time: {} }}",
                    header.frame_type, header.codec_id, header.avc_packet_type, header.composition_time
                );
                print_bytes("Body", &tag.body());
            }

            None => print_bytes("Unrecognized video", &tag.data),
        },

        FlvTagType::Audio => match tag.audio_header() {
            Some(header) => {
                println!(
                    "Audio {{ sound_format: {}, sound_rate: {}, sound_size: {}, sound_type: {}, packet_type: {:?} }}",
                    header.sound_format, header.sound_rate, header.sound_size, header.sound_type, header.aac_packet_type
                );
                print_bytes("Body", &tag.body());
            }

            None => print_bytes("Unrecognized audio", &tag.data),
        },

        FlvTagType::ScriptData => match tag.script_data() {
            Some(result) => {
                let (name, value) = result?;
                println!("Script data {{ name: {} }}", name);
                print_value(&value, 1);
            }

            None => print_bytes("Script data", &tag.data),
        },
    }

    Ok(())
}

fn print_value(value: &ScriptDataValue, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        ScriptDataValue::EcmaArray(properties) => {
            for (name, property) in properties {
                match property {
                    ScriptDataValue::EcmaArray(_) => {
                        println!("{}{}:", indent, name);
                        print_value(property, depth + 1);
                    }

                    _ => println!("{}{}: {:?}", indent, name, property),
                }
            }
        }

        value => println!("{}{:?}", indent, value),
    }
}

fn print_bytes(label: &str, data: &[u8]) {
    print!("{} {{ data: ", label);
    for (index, byte) in data.iter().enumerate() {
        if index >= MAX_PRINTED_BYTES {
            print!(".. ({}) ", data.len());
            break;
        }

        print!("{:02x}", byte);
    }

    println!(" }}");
}
