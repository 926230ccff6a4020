pub mod axi_spi;
