use clap::ValueEnum;
use clientlib_model::ClientlibType;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum TypeFlag {
    Js,
    Css,
    Link,
    Img,
}

impl TypeFlag {
    pub(crate) const fn as_domain(self) -> ClientlibType {
        match self {
            TypeFlag::Js => ClientlibType::Js,
            TypeFlag::Css => ClientlibType::Css,
            TypeFlag::Link => ClientlibType::Link,
            TypeFlag::Img => ClientlibType::Img,
        }
    }
}
