// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use progif::{Decoder, Progress, RasterAllocator};

fuzz_target!(|data: &[u8]| {
    let mut anim = Decoder::new(RasterAllocator::with_max_sz(1 << 22))
        .max_image_sz(Some(1 << 22))
        .into_animation();
    // parse in two steps, to exercise resumption
    let half = &data[..data.len() / 2];
    if anim.initialise(half).is_err() {
        return;
    }
    for i in 0..anim.frame_count_partial() {
        let _ = anim.decode_frame(half, i);
    }
    match anim.initialise(data) {
        Ok(Progress::Complete) | Ok(Progress::NeedData) => (),
        Err(_) => return,
    }
    for i in 0..anim.frame_count_partial() {
        let _ = anim.decode_frame(data, i);
    }
    anim.finalise();
});
