#![no_std]

use dectnr::capture::{DefaultBufferPool, FrameKind};
use dectnr::phy::{OperationStatus, PhyEvents};
use dectnr::role::{Receiver, Sniffer};

pub fn receive(data: &[u8]) -> f32 {
    let mut receiver = Receiver::new();
    receiver.on_data_received(-40.0, data);
    receiver.on_operation_complete(1, OperationStatus::Success);
    receiver.stats().success_rate()
}

pub fn sniff(pool: &mut DefaultBufferPool, header: &[u8]) -> usize {
    let (producer, mut consumer) = pool.split();
    let mut sniffer = Sniffer::new(producer);
    sniffer.on_header_received(-60.0, header);
    sniffer.on_operation_complete(1, OperationStatus::Success);

    let mut count = 0;
    while let Some(frame) = consumer.try_next() {
        if frame.kind() == FrameKind::Flush {
            break;
        }
        count += 1;
    }
    count
}
