/// Declares a group of command line options as two structs: `<Name>Cli`, which is meant
/// to be flattened into a clap parser, and `<Name>Args`, which is what the library code
/// takes. The args struct has the same defaults as the cli and builder style setters, so
/// tests and library users never have to go through clap.
#[macro_export]
macro_rules! args {
    ($(#$argsmeta:tt)* $name:ident {
        $($fhelp:literal $fname:ident: $ftype:ty = $fdefault:expr;)+
    }) => {
        $crate::bin_common::args::args_helper::paste! {
            #[derive(clap::Args, Debug)]
            pub struct [<$name Cli>] {
                $(
                    #[arg(long, default_value_t = ($fdefault), help = $fhelp)]
                    $fname: $ftype,
                )+
            }

            $(#$argsmeta)*
            pub struct [<$name Args>] {
                $(
                    $fname: $ftype,
                )+
            }

            impl std::default::Default for [<$name Args>] {
                fn default() -> Self {
                    Self {
                        $(
                            $fname: $fdefault,
                        )+
                    }
                }
            }

            impl [<$name Args>] {
                $(
                    pub fn $fname(mut self, $fname: $ftype) -> Self {
                        self.$fname = $fname;
                        self
                    }
                )+
            }

            impl [<$name Cli>] {
                pub fn to_args(&self) -> [<$name Args>] {
                    [<$name Args>] {
                        $(
                            $fname: self.$fname.clone(),
                        )+
                    }
                }
            }
        }
    };
}

pub use args;
pub use paste::paste;

#[cfg(test)]
mod test {
    use clap::Parser;

    crate::args! {
        #[derive(Clone, Debug, PartialEq)]
        Example {
            "How many"
            count: usize = 3;

            "How much"
            amount: f64 = 0.5;
        }
    }

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        example: ExampleCli,
    }

    #[test]
    fn cli_defaults_match_args_defaults() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(ExampleArgs::default(), cli.example.to_args());
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::parse_from(["test", "--count", "7"]);
        assert_eq!(ExampleArgs::default().count(7), cli.example.to_args());
    }
}
