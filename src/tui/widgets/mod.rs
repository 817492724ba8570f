pub mod beverage;
pub mod color;
pub mod help;
pub mod home;
pub mod login;
pub mod modals;
pub mod my_page;
pub mod stats_view;
pub mod status_bar;
pub mod tabs;
pub mod text_input;
pub mod time_picker;
