//===========================================================================//

// Error-constructor macros for code paths that report failures through
// std::io::Error (the container parser and the low-level payload codecs).

macro_rules! invalid_data {
    ($e:expr) => {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::InvalidData,
            $e,
        ))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::InvalidData,
            format!($fmt, $($arg)+),
        ))
    };
}

macro_rules! invalid_input {
    ($e:expr) => {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::InvalidInput,
            $e,
        ))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::InvalidInput,
            format!($fmt, $($arg)+),
        ))
    };
}

//===========================================================================//
