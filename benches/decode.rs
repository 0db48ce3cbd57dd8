use criterion::{black_box, criterion_group, criterion_main, Criterion};
use progif::{Decoder, Progress, RasterAllocator};
use weezl::{encode::Encoder, BitOrder};

/// Build an animated GIF with a few full-screen frames
fn make_gif(width: u16, height: u16, frames: usize) -> Vec<u8> {
    let mut gif = b"GIF89a".to_vec();
    gif.extend_from_slice(&width.to_le_bytes());
    gif.extend_from_slice(&height.to_le_bytes());
    gif.extend_from_slice(&[0xF7, 0, 0]);
    for i in 0..=255u8 {
        gif.extend_from_slice(&[i, i.wrapping_mul(3), 255 - i]);
    }
    let sz = usize::from(width) * usize::from(height);
    for f in 0..frames {
        let indices: Vec<u8> = (0..sz)
            .map(|i| ((i / 7 + f * 13 + i % usize::from(width)) % 256) as u8)
            .collect();
        let data = Encoder::new(BitOrder::Lsb, 8).encode(&indices).unwrap();
        gif.extend_from_slice(&[0x21, 0xF9, 4, 0x04, 4, 0, 0, 0]);
        gif.push(b',');
        for v in [0, 0, width, height] {
            gif.extend_from_slice(&v.to_le_bytes());
        }
        gif.extend_from_slice(&[0, 8]);
        for chunk in data.chunks(255) {
            gif.push(chunk.len() as u8);
            gif.extend_from_slice(chunk);
        }
        gif.push(0);
    }
    gif.push(b';');
    gif
}

fn decode_frames(crit: &mut Criterion) {
    let gif = make_gif(320, 240, 8);

    crit.bench_function("decode_frames", |b| {
        b.iter(|| {
            let mut anim =
                Decoder::new(RasterAllocator::default()).into_animation();
            let gif = black_box(&gif[..]);
            assert_eq!(anim.initialise(gif).unwrap(), Progress::Complete);
            for i in 0..anim.frame_count() {
                black_box(anim.decode_frame(gif, i).unwrap());
            }
        })
    });

    crit.bench_function("initialise_streaming", |b| {
        b.iter(|| {
            let mut anim =
                Decoder::new(RasterAllocator::default()).into_animation();
            let gif = black_box(&gif[..]);
            for len in (0..gif.len()).step_by(4096) {
                anim.initialise(&gif[..len]).unwrap();
            }
            assert_eq!(anim.initialise(gif).unwrap(), Progress::Complete);
        })
    });
}

criterion_group!(benches, decode_frames);
criterion_main!(benches);
