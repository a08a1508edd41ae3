use afl::*;
use arbitrary::Arbitrary;
use dectnr::capture::{BufferPool, FrameKind, LineFormat};

#[derive(Arbitrary, Debug)]
enum Step {
    Capture { header: bool, bytes: Vec<u8> },
    Emit,
    Drain { length_prefixed: bool },
}

fn main() {
    fuzz!(|steps: Vec<Step>| {
        let mut pool = BufferPool::<4, 32>::new();
        let (mut producer, mut consumer) = pool.split();
        let mut out = String::new();
        let mut queued = 0usize;

        for step in steps {
            match step {
                Step::Capture { header, bytes } => {
                    let kind = if header {
                        FrameKind::Header
                    } else {
                        FrameKind::Data
                    };
                    if producer.capture(kind, &bytes).is_ok() {
                        queued += 1;
                    } else {
                        assert_eq!(queued, 4);
                    }
                }
                Step::Emit => {
                    if let Some(frame) = consumer.try_next() {
                        assert!(frame.len() <= 32);
                        frame.emit(LineFormat::Simple, &mut out).unwrap();
                        queued -= 1;
                    }
                }
                Step::Drain { length_prefixed } => {
                    let format = if length_prefixed {
                        LineFormat::LengthPrefixed
                    } else {
                        LineFormat::Simple
                    };
                    queued -= consumer.drain(format, &mut out);
                }
            }
            assert_eq!(consumer.pool().queued_count(), queued);
            assert_eq!(consumer.pool().free_count(), 4 - queued);
        }
    });
}
