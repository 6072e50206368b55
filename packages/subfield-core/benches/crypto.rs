//! Throughput of the hot paths: hashing, the standalone cipher, signing and
//! Noise transport.
//!
//! ```bash
//! cargo bench -p subfield-core
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use subfield_core::crypto::{hash, Cipher, KeyPair};
use subfield_core::NoiseSession;

const SIZES: [usize; 3] = [64, 1024, 64 * 1024];

fn connected() -> (NoiseSession, NoiseSession) {
    let mut initiator = NoiseSession::initiator();
    let mut responder = NoiseSession::responder();
    let msg1 = initiator.handshake_step_1().unwrap();
    let msg2 = responder.handshake_step_2(&msg1).unwrap();
    initiator.handshake_step_3(&msg2).unwrap();
    (initiator, responder)
}

fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");
    for size in SIZES {
        let data = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| hash(black_box(data)))
        });
    }
    group.finish();
}

fn bench_cipher(c: &mut Criterion) {
    let cipher = Cipher::random().unwrap();
    let mut group = c.benchmark_group("cipher_encrypt");
    for size in SIZES {
        let data = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| cipher.encrypt(black_box(data)).unwrap())
        });
    }
    group.finish();
}

fn bench_keys(c: &mut Criterion) {
    let alice = KeyPair::random().unwrap();
    let bob = KeyPair::random().unwrap();
    let signature = alice.sign(b"benchmark message");

    c.bench_function("keypair_random", |b| b.iter(|| KeyPair::random().unwrap()));
    c.bench_function("sign", |b| b.iter(|| alice.sign(black_box(b"benchmark message"))));
    c.bench_function("verify", |b| {
        b.iter(|| alice.public_key().verify(black_box(b"benchmark message"), &signature))
    });
    c.bench_function("shared_secret", |b| {
        b.iter(|| alice.shared_secret(black_box(bob.public_key())).unwrap())
    });
}

fn bench_noise(c: &mut Criterion) {
    c.bench_function("noise_handshake", |b| b.iter(connected));

    let (initiator, responder) = connected();
    let mut group = c.benchmark_group("noise_roundtrip");
    for size in SIZES {
        let data = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let ciphertext = initiator.encrypt(black_box(data)).unwrap();
                responder.decrypt(&ciphertext).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hash, bench_cipher, bench_keys, bench_noise);
criterion_main!(benches);
