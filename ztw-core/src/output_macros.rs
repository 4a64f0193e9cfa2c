//! Output macros for the ztw CLI.
//!
//! Report lines (reconciliation outcomes, listings) go to stdout; status and
//! error lines go to stderr so stdout stays machine-consumable.

#[macro_export]
macro_rules! ztw_println {
    () => {
        println!();
    };
    ($($arg:tt)*) => {
        println!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! ztw_error {
    ($($arg:tt)*) => {
        eprintln!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! ztw_success {
    ($($arg:tt)*) => {
        eprintln!("✓ {}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! ztw_progress {
    ($($arg:tt)*) => {
        eprintln!("▶ {}", format!($($arg)*));
    }
}
