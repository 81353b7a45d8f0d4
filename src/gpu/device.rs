//! GPU device handles and adapter enumeration
//!
//! Wraps wgpu device/queue creation. The harness validates the relaxation
//! engine on every adapter the instance exposes, so alongside the default
//! single-device path there is [`GpuDevice::enumerate`], which yields one
//! handle per adapter.

use thiserror::Error;
use wgpu::util::DeviceExt;

/// GPU device initialization errors
#[derive(Debug, Error)]
pub enum GpuDeviceError {
    /// No compatible GPU adapter found
    #[error("No compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device
    #[error("Failed to request GPU device: {0}")]
    DeviceRequest(String),
}

/// One compute device: adapter plus its device/queue pair
///
/// Each [`crate::gpu::RelaxEngine`] binds to exactly one `GpuDevice`;
/// sessions never migrate between devices.
#[derive(Debug)]
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
}

impl GpuDevice {
    /// Check if a GPU is available without keeping a device
    ///
    /// Lets tests skip gracefully on GPU-less machines.
    pub async fn is_gpu_available() -> bool {
        Self::new().await.is_ok()
    }

    /// Initialize the highest-performance available device
    ///
    /// # Errors
    ///
    /// Returns `GpuDeviceError` if no adapter is found or the device request
    /// fails.
    pub async fn new() -> Result<Self, GpuDeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuDeviceError::NoAdapter)?;

        Self::from_adapter(adapter).await
    }

    /// One handle per adapter the instance exposes
    ///
    /// Adapters whose device request fails are skipped with a warning rather
    /// than failing the enumeration; filtering beyond that is the caller's
    /// concern.
    pub async fn enumerate() -> Vec<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let mut devices = Vec::new();
        for adapter in instance.enumerate_adapters(wgpu::Backends::all()) {
            let info = adapter.get_info();
            match Self::from_adapter(adapter).await {
                Ok(device) => devices.push(device),
                Err(error) => {
                    tracing::warn!(adapter = %info.name, %error, "skipping adapter");
                }
            }
        }
        devices
    }

    async fn from_adapter(adapter: wgpu::Adapter) -> Result<Self, GpuDeviceError> {
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("waypath relaxation device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| GpuDeviceError::DeviceRequest(e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter,
        })
    }

    /// Adapter name, used in harness labels and diagnostics
    #[must_use]
    pub fn label(&self) -> String {
        self.adapter.get_info().name
    }

    /// Adapter info (name, backend, device type)
    #[must_use]
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Create a GPU buffer seeded with `contents`
    #[must_use]
    pub fn create_buffer_init(
        &self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
    }

    /// Create an empty GPU buffer of `size` bytes
    #[must_use]
    pub fn create_buffer(&self, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Get device reference
    #[must_use]
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get queue reference
    #[must_use]
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
