use std::time::Duration;

/// A captured camera image handed to a landmark provider: contiguous RGB
/// bytes in row-major order.
///
/// The estimation core never looks at pixels; only providers do.
#[derive(Clone, Debug)]
pub struct ImageFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    timestamp: Duration,
}

impl ImageFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, timestamp: Duration) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            timestamp,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }
}
