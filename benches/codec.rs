// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use uadp_pubsub::codec::{encode, EncodeSecurity};
use uadp_pubsub::model::{DataSetMessageType, NetworkMessageBuilder, PublisherId, Variant};
use uadp_pubsub::preencode::PreencodeCtx;
use uadp_pubsub::security::SecurityCtx;

fn sample_message() -> uadp_pubsub::model::NetworkMessage {
    let mut msg = NetworkMessageBuilder::new(1)
        .publisher_id(PublisherId::Byte(46))
        .group(42, 1000)
        .build();
    let dsm = msg.add_dataset_message(255, DataSetMessageType::KeyFrame);
    dsm.push_field(Variant::UInt32(12_071_982));
    dsm.push_field(Variant::Byte(239));
    dsm.push_field(Variant::UInt16(64852));
    dsm.push_field(Variant::Float(0.12));
    dsm.push_field(Variant::UInt32(369_852));
    msg
}

fn bench_plain_encode(c: &mut Criterion) {
    let msg = sample_message();
    c.bench_function("encode_unsecured", |b| {
        b.iter(|| encode(black_box(&msg), None).unwrap());
    });
}

fn bench_secured_encode(c: &mut Criterion) {
    let msg = sample_message();
    let ctx = SecurityCtx::new_encrypted(1, vec![0x5Au8; 32], vec![0x11u8; 32], [1, 2, 3, 4]);
    c.bench_function("encode_signed_and_encrypted", |b| {
        b.iter(|| {
            encode(
                black_box(&msg),
                Some(EncodeSecurity {
                    ctx: &ctx,
                    nonce_random: [0, 0, 0, 1],
                }),
            )
            .unwrap()
        });
    });
}

fn bench_preencode_refresh(c: &mut Criterion) {
    let mut msg = sample_message();
    let mut ctx = PreencodeCtx::build(&msg).unwrap();
    let mut seq = 0u16;
    c.bench_function("preencode_refresh", |b| {
        b.iter(|| {
            seq = seq.wrapping_add(1);
            msg.dataset_message_mut(0).unwrap().set_sequence_number(seq);
            ctx.refresh(black_box(&msg)).unwrap();
        });
    });
}

criterion_group!(benches, bench_plain_encode, bench_secured_encode, bench_preencode_refresh);
criterion_main!(benches);
