pub mod cms;
