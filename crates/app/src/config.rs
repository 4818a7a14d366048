//! Command-line configuration. Flags use `--key=value`; bad values fall back
//! to defaults with a warning.

use std::path::PathBuf;

use platform::BackendKind;

pub const DEFAULT_MODEL: &str = "./ninja/ninja.sbm";
pub const DEFAULT_TEXTURE: &str = "./ninja/ninjacomp.bmp";
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub model: PathBuf,
    /// `None` draws with a generated checkerboard.
    pub texture: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub gpu_backends: wgpu::Backends,
    pub window: BackendKind,
    /// Stop after this many rendered frames.
    pub max_frames: Option<u64>,
    pub show_fps: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from(DEFAULT_MODEL),
            texture: Some(PathBuf::from(DEFAULT_TEXTURE)),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            gpu_backends: wgpu::Backends::all(),
            window: BackendKind::default(),
            max_frames: None,
            show_fps: false,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cfg = Self::default();
        let mut no_texture = false;

        for arg in args {
            let arg = arg.as_ref();
            if let Some(v) = arg.strip_prefix("--model=") {
                cfg.model = PathBuf::from(v);
            } else if let Some(v) = arg.strip_prefix("--texture=") {
                cfg.texture = Some(PathBuf::from(v));
            } else if arg == "--no-texture" {
                no_texture = true;
            } else if let Some(v) = arg.strip_prefix("--size=") {
                match parse_size(v) {
                    Some((w, h)) => {
                        cfg.width = w;
                        cfg.height = h;
                    }
                    None => log::warn!("Bad --size '{}', expected WxH", v),
                }
            } else if let Some(v) = arg.strip_prefix("--width=") {
                match v.parse::<u32>() {
                    Ok(w) => cfg.width = w,
                    Err(_) => log::warn!("Bad --width '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--height=") {
                match v.parse::<u32>() {
                    Ok(h) => cfg.height = h,
                    Err(_) => log::warn!("Bad --height '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--gpu-backend=") {
                cfg.gpu_backends = parse_gpu_backend(v);
            } else if let Some(v) = arg.strip_prefix("--window=") {
                match v.parse::<BackendKind>() {
                    Ok(kind) => cfg.window = kind,
                    Err(e) => log::warn!("{}, falling back to {}", e, cfg.window),
                }
            } else if let Some(v) = arg.strip_prefix("--frames=") {
                match v.parse::<u64>() {
                    Ok(n) => cfg.max_frames = Some(n),
                    Err(_) => log::warn!("Bad --frames '{}'", v),
                }
            } else if arg == "--show-fps" {
                cfg.show_fps = true;
            } else if let Some(v) = arg.strip_prefix("--show-fps=") {
                cfg.show_fps = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes");
            } else {
                log::warn!("Ignoring unknown argument '{}'", arg);
            }
        }

        if no_texture {
            cfg.texture = None;
        }
        cfg.width = cfg.width.max(1);
        cfg.height = cfg.height.max(1);
        cfg
    }
}

fn parse_size(v: &str) -> Option<(u32, u32)> {
    let (w, h) = v.split_once('x').or_else(|| v.split_once('X'))?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn parse_gpu_backend(v: &str) -> wgpu::Backends {
    match v.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}
