pub mod device_icon_po;
