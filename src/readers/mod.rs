pub mod huawei_hg659;
pub mod zeversolar_tlc5000;
