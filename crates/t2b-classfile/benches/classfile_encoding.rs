use criterion::{black_box, criterion_group, criterion_main, Criterion};
use t2b_classfile::{access, ClassFile};

fn sample_class() -> ClassFile {
    let mut class = ClassFile::new("com/acme/CalculatorTest", "java/lang/Object").unwrap();
    for i in 0..64 {
        class
            .add_method(access::PUBLIC, &format!("test{}", i), "(ILjava/lang/String;)V")
            .unwrap();
    }
    class
}

fn bench_encode(c: &mut Criterion) {
    let class = sample_class();
    c.bench_function("encode_class", |b| b.iter(|| black_box(&class).encode()));
}

fn bench_decode(c: &mut Criterion) {
    let bytes = sample_class().encode();
    c.bench_function("decode_class", |b| {
        b.iter(|| ClassFile::decode(black_box(&bytes)).unwrap())
    });
}

fn bench_rename(c: &mut Criterion) {
    let class = sample_class();
    c.bench_function("rename_class", |b| {
        b.iter(|| {
            let mut class = class.clone();
            class.rename_class("com/acme/CalculatorTestBench").unwrap();
            class
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_rename);
criterion_main!(benches);
