use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use clap::Parser;
use dectnr::capture::LineFormat;
use dectnr_sniff::{config_reply, describe, Decoded, LineDecoder, Result};
use log::{debug, info, warn};

/// Read DECT NR+ sniffer lines and forward every packet as a UDP datagram,
/// e.g. to capture it with Wireshark.
///
/// A serial device must already be configured (baud rate 115200), for
/// instance with `stty`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial device or file with the sniffer output, `-` for stdin.
    #[arg(short, long, default_value = "-")]
    serial_port: String,
    /// Multicast group the packets are sent to.
    #[arg(short, long, default_value = "224.0.31.41")]
    multicast_ip: Ipv4Addr,
    /// UDP port the packets are sent to.
    #[arg(short, long, default_value_t = 31414)]
    udp_port: u16,
    /// Network id given to the device when it asks for its configuration.
    #[arg(short, long, default_value = "0x12345678", value_parser = parse_u32)]
    network_id: u32,
    /// Carrier given to the device when it asks for its configuration.
    #[arg(short, long, default_value_t = 1663)]
    carrier: u16,
    /// Print every line on the terminal.
    #[arg(short, long)]
    debug: bool,
    /// Data lines carry a 4 digit length field.
    #[arg(short, long)]
    length_prefixed: bool,
}

fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "info" }),
    )
    .init();

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.set_multicast_ttl_v4(1)?;
    let target = SocketAddrV4::new(args.multicast_ip, args.udp_port);

    let (mut reader, mut device): (Box<dyn BufRead>, Option<File>) = if args.serial_port == "-" {
        (Box::new(io::stdin().lock()), None)
    } else {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&args.serial_port)?;
        (Box::new(BufReader::new(file.try_clone()?)), Some(file))
    };

    info!(
        "Starting DECT NR+ sniffer on {}, forwarding to {}",
        args.serial_port, target
    );

    let format = if args.length_prefixed {
        LineFormat::LengthPrefixed
    } else {
        LineFormat::Simple
    };
    let mut decoder = LineDecoder::new(format);

    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }

        // Boot noise on the serial line is often not valid UTF-8
        let line = String::from_utf8_lossy(&raw);
        if let Cow::Owned(_) = line {
            warn!("Invalid UTF-8 in {line:?}");
        }

        let decoded = match decoder.decode(&line) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Skipping {line:?}: {e}");
                continue;
            }
        };

        if args.debug {
            println!("{}", describe(&decoded));
        }

        match decoded {
            Decoded::ConfigRequest => match device.as_mut() {
                Some(device) => {
                    device.write_all(&config_reply(args.network_id, args.carrier))?;
                    debug!(
                        "Sent network id {:#x} and carrier {}",
                        args.network_id, args.carrier
                    );
                }
                None => warn!("Device asked for its configuration, but stdin is not writable"),
            },
            Decoded::Packet(packet) => {
                socket.send_to(&packet, target)?;
            }
            Decoded::Pending | Decoded::Ignored => (),
        }
    }

    info!("Input closed, exiting");
    Ok(())
}
