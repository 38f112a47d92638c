//! Closed, tagged forms of document identifiers.
//!
//! Parsing only checks shape; whether a name exists is decided when the
//! [`HydrationStore`](crate::HydrationStore) resolves it.

use core::fmt;

use propjockey_core::{CurveParams, StepJump};

use crate::document::{FactoryArg, Identifier};
use crate::error::ConfigError;
use crate::Result;

pub const MEMOIZE_CUBIC: &str = "memoize.cubic-bezier";
pub const FACTORY_CUBIC: &str = "factory.cubic-bezier";
pub const REUSE_CUBIC: &str = "reuse-cache.cubic-bezier";
pub const MEMOIZE_QUADRATIC: &str = "memoize.quadratic-bezier";
pub const REUSE_QUADRATIC: &str = "reuse-cache.quadratic-bezier";
pub const FACTORY_STEPS: &str = "factory.steps";
pub const CHAIN: &str = "yodawg.easing";

#[derive(Clone, Debug, PartialEq)]
pub enum EaseKind {
    /// Built-in table entry or user registration.
    Named(String),
    Memoize(CurveParams),
    ReuseCache(CurveParams),
    Steps { count: u32, jump: StepJump },
    /// Each ease's output feeds the next.
    Chain(Vec<EaseKind>),
}

impl EaseKind {
    pub fn parse(identifier: &Identifier) -> Result<Self> {
        match identifier {
            Identifier::Name(name) => Ok(EaseKind::Named(name.clone())),
            Identifier::Call(args) => Self::parse_call(args),
        }
    }

    fn parse_arg(arg: &FactoryArg, factory: &str) -> Result<Self> {
        match arg {
            FactoryArg::Text(name) => Ok(EaseKind::Named(name.clone())),
            FactoryArg::Call(args) => Self::parse_call(args),
            FactoryArg::Number(n) => Err(ConfigError::bad_call(
                factory,
                format!("expected an ease identifier, got {n}"),
            )),
        }
    }

    fn parse_call(args: &[FactoryArg]) -> Result<Self> {
        let (factory, rest) = split_call(args)?;
        match factory {
            MEMOIZE_CUBIC | FACTORY_CUBIC => {
                let [x1, y1, x2, y2] = numbers(factory, rest)?;
                Ok(EaseKind::Memoize(CurveParams::cubic(x1, y1, x2, y2)))
            }
            REUSE_CUBIC => {
                let [x1, y1, x2, y2] = numbers(factory, rest)?;
                Ok(EaseKind::ReuseCache(CurveParams::cubic(x1, y1, x2, y2)))
            }
            MEMOIZE_QUADRATIC => {
                let [x, y] = numbers(factory, rest)?;
                Ok(EaseKind::Memoize(CurveParams::quadratic(x, y)))
            }
            REUSE_QUADRATIC => {
                let [x, y] = numbers(factory, rest)?;
                Ok(EaseKind::ReuseCache(CurveParams::quadratic(x, y)))
            }
            FACTORY_STEPS => {
                let (count, jump) = match rest {
                    [FactoryArg::Number(n)] => (*n, StepJump::default()),
                    [FactoryArg::Number(n), FactoryArg::Text(term)] => {
                        let jump = term.parse::<StepJump>().map_err(|_| {
                            ConfigError::bad_call(factory, format!("unknown jump term '{term}'"))
                        })?;
                        (*n, jump)
                    }
                    _ => return Err(ConfigError::bad_call(factory, "expected (count, jump term?)")),
                };
                if count.fract() != 0.0 || count < 1.0 || count > f64::from(u32::MAX) {
                    return Err(ConfigError::bad_call(
                        factory,
                        format!("step count {count} is not a positive integer"),
                    ));
                }
                Ok(EaseKind::Steps {
                    count: count as u32,
                    jump,
                })
            }
            CHAIN => rest
                .iter()
                .map(|arg| Self::parse_arg(arg, factory))
                .collect::<Result<Vec<_>>>()
                .map(EaseKind::Chain),
            other => Err(ConfigError::unknown("ease factory", other)),
        }
    }
}

fn split_call(args: &[FactoryArg]) -> Result<(&str, &[FactoryArg])> {
    match args.split_first() {
        Some((FactoryArg::Text(head), rest)) => Ok((head.as_str(), rest)),
        Some((head, _)) => Err(ConfigError::bad_call(
            format!("{head:?}"),
            "the first element must name a factory",
        )),
        None => Err(ConfigError::bad_call("[]", "empty factory call")),
    }
}

fn numbers<const N: usize>(factory: &str, args: &[FactoryArg]) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    if args.len() != N {
        return Err(ConfigError::bad_call(
            factory,
            format!("expected {N} numbers, got {} arguments", args.len()),
        ));
    }
    for (slot, arg) in out.iter_mut().zip(args) {
        match arg {
            FactoryArg::Number(n) if n.is_finite() => *slot = *n,
            other => {
                return Err(ConfigError::bad_call(
                    factory,
                    format!("expected a number, got {other:?}"),
                ))
            }
        }
    }
    Ok(out)
}

/// Names only; none of these have factory forms.
fn plain_name<'a>(identifier: &'a Identifier, kind: &'static str) -> Result<&'a str> {
    match identifier {
        Identifier::Name(name) => Ok(name),
        Identifier::Call(args) => {
            let (factory, _) = split_call(args)?;
            Err(ConfigError::unknown(kind, factory))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlideKind {
    Number,
    Byte,
    ColorHex,
    ColorHexa,
    Custom(String),
}

impl SlideKind {
    pub fn parse(identifier: &Identifier) -> Result<Self> {
        Ok(match plain_name(identifier, "slide")? {
            "slide.number" => SlideKind::Number,
            "slide.byte" => SlideKind::Byte,
            "slide.color.hex" => SlideKind::ColorHex,
            "slide.color.hexa" => SlideKind::ColorHexa,
            other => SlideKind::Custom(other.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetterKind {
    Prop,
    PropUnit,
    PropRound,
    Custom(String),
}

impl SetterKind {
    pub fn parse(identifier: &Identifier) -> Result<Self> {
        Ok(match plain_name(identifier, "setter")? {
            "setter.object.prop" => SetterKind::Prop,
            "setter.object.prop.unit" => SetterKind::PropUnit,
            "setter.object.prop.round" => SetterKind::PropRound,
            other => SetterKind::Custom(other.to_string()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimingKind {
    Manual,
    FrameCallback,
    Interval60,
    Interval30,
    Custom(String),
}

impl TimingKind {
    pub fn parse(identifier: &Identifier) -> Result<Self> {
        Ok(match plain_name(identifier, "timing pool")? {
            "timing.manual" => TimingKind::Manual,
            "timing.frame-callback" => TimingKind::FrameCallback,
            "timing.interval.60fps" => TimingKind::Interval60,
            "timing.interval.30fps" => TimingKind::Interval30,
            other => TimingKind::Custom(other.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            TimingKind::Manual => "timing.manual",
            TimingKind::FrameCallback => "timing.frame-callback",
            TimingKind::Interval60 => "timing.interval.60fps",
            TimingKind::Interval30 => "timing.interval.30fps",
            TimingKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for TimingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
