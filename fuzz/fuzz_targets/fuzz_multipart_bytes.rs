#![no_main]

use std::convert::Infallible;

use futures_util::stream::iter;
use libfuzzer_sys::fuzz_target;
use multipart_form::bytes::Bytes;
use multipart_form::{Config, FormDataParser, MemorySink, Multipart};
use tokio::runtime;

fn chunks(data: &[u8], size: usize) -> Vec<Result<Bytes, Infallible>> {
    data.chunks(size.max(1)).map(|c| Ok(Bytes::copy_from_slice(c))).collect()
}

fuzz_target!(|data: &[u8]| {
    let Some((&knob, body)) = data.split_first() else {
        return;
    };

    // Small buffers put delimiters across refills.
    let buffer_size = usize::from(knob % 32) + 1;
    let chunk_size = usize::from(knob / 32) * 7 + 1;

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    rt.block_on(async {
        let config = Config::new().boundary("X-BOUNDARY").buffer_size(buffer_size);
        let mut multipart = Multipart::with_config(iter(chunks(body, chunk_size)), config);

        let mut breaks = 0;
        while breaks < 3 {
            match multipart.next_field().await {
                Err(_) | Ok(None) => breaks += 1,
                Ok(Some(_)) => continue,
            }
        }

        let config = Config::new().buffer_size(buffer_size);
        let _ = FormDataParser::new(iter(chunks(body, chunk_size)), config)
            .parse(MemorySink)
            .await;
    })
});
